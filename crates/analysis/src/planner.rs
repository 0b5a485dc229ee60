use crate::breakpoints::{BreakpointResult, Tier};
use serde::{Deserialize, Serialize};

/// Tier-specific shape of an analysis unit. Only batches carry a
/// multi-transition list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum UnitKind {
    Minor { transition: usize },
    MinorBatch { transitions: Vec<usize> },
    Moderate { transition: usize },
    Major { transition: usize },
}

impl UnitKind {
    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::Minor { .. } => "minor",
            UnitKind::MinorBatch { .. } => "minor_batch",
            UnitKind::Moderate { .. } => "moderate",
            UnitKind::Major { .. } => "major",
        }
    }
}

/// One or more transitions grouped for narration at matching depth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisUnit {
    /// Snapshot indices spanned: (first snapshot, last snapshot).
    pub snapshot_range: (usize, usize),
    pub kind: UnitKind,
    pub total_magnitude: f64,
    pub description: String,
}

impl AnalysisUnit {
    /// Member transition indices in timeline order.
    pub fn transitions(&self) -> &[usize] {
        match &self.kind {
            UnitKind::MinorBatch { transitions } => transitions,
            UnitKind::Minor { transition }
            | UnitKind::Moderate { transition }
            | UnitKind::Major { transition } => std::slice::from_ref(transition),
        }
    }

    /// Major changes mark points where the narration step should refresh
    /// its cached architectural summary.
    pub fn is_inflection_point(&self) -> bool {
        matches!(self.kind, UnitKind::Major { .. })
    }
}

/// Group transitions into ordered analysis units.
///
/// Consecutive minor transitions batch into one unit; moderate and major
/// transitions stand alone. The result covers transitions `[0, N)`
/// exactly once, in order — violating that is an upstream bug and fails
/// hard, it is not a runtime condition to recover from.
pub fn plan_units(magnitudes: &[f64], breakpoints: &BreakpointResult) -> Vec<AnalysisUnit> {
    let mut units = Vec::new();
    let mut minor_run: Vec<usize> = Vec::new();

    for (i, &magnitude) in magnitudes.iter().enumerate() {
        match breakpoints.classify(magnitude) {
            Tier::Minor => minor_run.push(i),
            tier => {
                flush_minor_run(&mut minor_run, magnitudes, &mut units);
                let (kind, description) = match tier {
                    Tier::Major => (
                        UnitKind::Major { transition: i },
                        format!(
                            "Snapshot {i} -> {} (MAJOR change, magnitude {magnitude:.4})",
                            i + 1
                        ),
                    ),
                    _ => (
                        UnitKind::Moderate { transition: i },
                        format!(
                            "Snapshot {i} -> {} (moderate change, magnitude {magnitude:.4})",
                            i + 1
                        ),
                    ),
                };
                units.push(AnalysisUnit {
                    snapshot_range: (i, i + 1),
                    kind,
                    total_magnitude: magnitude,
                    description,
                });
            }
        }
    }
    flush_minor_run(&mut minor_run, magnitudes, &mut units);

    assert_coverage(&units, magnitudes.len());
    units
}

fn flush_minor_run(run: &mut Vec<usize>, magnitudes: &[f64], units: &mut Vec<AnalysisUnit>) {
    let run = std::mem::take(run);
    match run.as_slice() {
        [] => {}
        [transition] => {
            let transition = *transition;
            units.push(AnalysisUnit {
                snapshot_range: (transition, transition + 1),
                kind: UnitKind::Minor { transition },
                total_magnitude: magnitudes[transition],
                description: format!("Snapshot {transition} -> {} (minor change)", transition + 1),
            });
        }
        [first, .., last] => {
            let (first, last) = (*first, *last);
            let total_magnitude = run.iter().map(|&i| magnitudes[i]).sum();
            let description = format!(
                "Snapshots {first} -> {} ({} minor transitions)",
                last + 1,
                run.len()
            );
            units.push(AnalysisUnit {
                snapshot_range: (first, last + 1),
                kind: UnitKind::MinorBatch { transitions: run },
                total_magnitude,
                description,
            });
        }
    }
}

fn assert_coverage(units: &[AnalysisUnit], transition_count: usize) {
    let mut expected = 0usize;
    for unit in units {
        for &transition in unit.transitions() {
            assert_eq!(
                transition, expected,
                "planned units must cover transitions in order with no gaps"
            );
            expected += 1;
        }
    }
    assert_eq!(
        expected, transition_count,
        "planned units must cover every transition exactly once"
    );
}
