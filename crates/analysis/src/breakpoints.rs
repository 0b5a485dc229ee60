use serde::{Deserialize, Serialize};

/// Below this many transitions the gap method is unreliable; a
/// percentile split is used instead.
const GAP_METHOD_FLOOR: usize = 4;

/// Thresholds used when there are no magnitudes at all.
const EMPTY_MINOR_THRESHOLD: f64 = 0.05;
const EMPTY_MAJOR_THRESHOLD: f64 = 0.20;

/// Classification of a transition's magnitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Minor,
    Moderate,
    Major,
}

/// Distribution diagnostics. Reported for inspection only; threshold
/// selection never feeds back on these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub q3: f64,
    pub method: String,
}

/// Adaptive minor/major thresholds over a project's magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakpointResult {
    pub minor_threshold: f64,
    pub major_threshold: f64,
    pub distribution_stats: DistributionStats,
}

impl BreakpointResult {
    /// Fixed tie convention: `value <= minor` is minor, `value > major`
    /// is major, everything else moderate.
    pub fn classify(&self, magnitude: f64) -> Tier {
        if magnitude <= self.minor_threshold {
            Tier::Minor
        } else if magnitude > self.major_threshold {
            Tier::Major
        } else {
            Tier::Moderate
        }
    }
}

/// Partition the magnitude range into minor/moderate/major without fixed
/// thresholds. Never fails: empty, singleton, and all-equal inputs fall
/// through explicit degenerate paths.
pub fn find_breakpoints(magnitudes: &[f64]) -> BreakpointResult {
    if magnitudes.is_empty() {
        return BreakpointResult {
            minor_threshold: EMPTY_MINOR_THRESHOLD,
            major_threshold: EMPTY_MAJOR_THRESHOLD,
            distribution_stats: DistributionStats {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                median: 0.0,
                std_dev: 0.0,
                q1: 0.0,
                q3: 0.0,
                method: "default".to_string(),
            },
        };
    }

    let mut sorted = magnitudes.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let mut stats = DistributionStats {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        median: percentile(&sorted, 50.0),
        std_dev: variance.sqrt(),
        q1: percentile(&sorted, 25.0),
        q3: percentile(&sorted, 75.0),
        method: String::new(),
    };

    let (minor_threshold, major_threshold) = if n < GAP_METHOD_FLOOR {
        stats.method = "percentile".to_string();
        (percentile(&sorted, 33.0), percentile(&sorted, 67.0))
    } else {
        stats.method = "natural_breaks".to_string();
        natural_break_thresholds(&sorted)
    };

    debug_assert!(minor_threshold <= major_threshold);
    BreakpointResult {
        minor_threshold,
        major_threshold,
        distribution_stats: stats,
    }
}

/// Midpoints of the two largest gaps between adjacent sorted values.
/// Ties prefer the gap at the smaller sorted index.
fn natural_break_thresholds(sorted: &[f64]) -> (f64, f64) {
    let mut gaps: Vec<(f64, usize)> = sorted
        .windows(2)
        .enumerate()
        .map(|(i, pair)| (pair[1] - pair[0], i))
        .collect();
    gaps.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut positions = [gaps[0].1, gaps[1].1];
    positions.sort_unstable();

    let minor = (sorted[positions[0]] + sorted[positions[0] + 1]) / 2.0;
    let major = (sorted[positions[1]] + sorted[positions[1] + 1]) / 2.0;
    (minor, major)
}

/// Linear-interpolation percentile over sorted values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn two_largest_gaps_set_the_thresholds() {
        let magnitudes = [0.01, 0.02, 0.60, 0.03, 0.58];
        let result = find_breakpoints(&magnitudes);
        assert_close(result.minor_threshold, 0.305);
        assert_close(result.major_threshold, 0.59);
        assert_eq!(result.distribution_stats.method, "natural_breaks");
        assert_eq!(result.distribution_stats.count, 5);
    }

    #[test]
    fn classification_follows_the_tie_convention() {
        let result = find_breakpoints(&[0.01, 0.02, 0.60, 0.03, 0.58]);
        assert_eq!(result.classify(0.01), Tier::Minor);
        assert_eq!(result.classify(result.minor_threshold), Tier::Minor);
        assert_eq!(result.classify(0.58), Tier::Moderate);
        assert_eq!(result.classify(result.major_threshold), Tier::Moderate);
        assert_eq!(result.classify(0.60), Tier::Major);
    }

    #[test]
    fn thresholds_are_ordered_and_in_range() {
        let cases: &[&[f64]] = &[
            &[0.5],
            &[0.1, 0.9],
            &[0.2, 0.2, 0.2],
            &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
            &[0.9, 0.1, 0.5, 0.3, 0.7, 0.2, 0.8],
        ];
        for magnitudes in cases {
            let result = find_breakpoints(magnitudes);
            let min = magnitudes.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = magnitudes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(result.minor_threshold <= result.major_threshold);
            assert!(result.minor_threshold >= min && result.minor_threshold <= max);
            assert!(result.major_threshold >= min && result.major_threshold <= max);
        }
    }

    #[test]
    fn empty_input_gets_fixed_defaults() {
        let result = find_breakpoints(&[]);
        assert_close(result.minor_threshold, 0.05);
        assert_close(result.major_threshold, 0.20);
        assert_eq!(result.distribution_stats.method, "default");
    }

    #[test]
    fn singleton_collapses_both_thresholds() {
        let result = find_breakpoints(&[0.42]);
        assert_close(result.minor_threshold, 0.42);
        assert_close(result.major_threshold, 0.42);
        assert_eq!(result.distribution_stats.method, "percentile");
    }

    #[test]
    fn all_equal_input_collapses_thresholds_to_the_value() {
        let result = find_breakpoints(&[0.3, 0.3, 0.3, 0.3, 0.3]);
        assert_close(result.minor_threshold, 0.3);
        assert_close(result.major_threshold, 0.3);
        // Everything then classifies consistently as one tier.
        assert_eq!(result.classify(0.3), Tier::Minor);
    }

    #[test]
    fn gap_ties_prefer_the_smaller_sorted_index() {
        // Two equal gaps of 0.4: indices 1 and 3. Both get used, ordered
        // ascending, so the tie-break is observable through which gap
        // becomes the minor threshold.
        let result = find_breakpoints(&[0.0, 0.1, 0.5, 0.5, 0.9]);
        assert_close(result.minor_threshold, 0.3);
        assert_close(result.major_threshold, 0.7);
    }

    #[test]
    fn small_inputs_use_the_percentile_split() {
        let result = find_breakpoints(&[0.1, 0.2, 0.4]);
        assert_eq!(result.distribution_stats.method, "percentile");
        // 33rd and 67th percentiles over [0.1, 0.2, 0.4].
        assert_close(result.minor_threshold, 0.166);
        assert_close(result.major_threshold, 0.268);
    }

    #[test]
    fn distribution_stats_are_plain_diagnostics() {
        let result = find_breakpoints(&[0.1, 0.2, 0.3, 0.4]);
        let stats = &result.distribution_stats;
        assert_close(stats.min, 0.1);
        assert_close(stats.max, 0.4);
        assert_close(stats.mean, 0.25);
        assert_close(stats.median, 0.25);
        assert_close(stats.q1, 0.175);
        assert_close(stats.q3, 0.325);
    }
}
