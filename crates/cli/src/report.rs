use std::collections::BTreeMap;
use std::fmt::Write;
use strata_analysis::{AnalysisUnit, TimelineAnalysis, UnitKind};
use strata_diff::SnapshotDiff;
use strata_progress::ProgressTracker;

/// Human-readable summary of an analysis plan.
pub fn summarize_plan(analysis: &TimelineAnalysis) -> String {
    let stats = &analysis.breakpoints.distribution_stats;
    let mut out = String::new();

    let _ = writeln!(out, "Analysis Plan Summary");
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);
    let _ = writeln!(out, "Change Distribution ({} transitions):", stats.count);
    let _ = writeln!(out, "  Method: {}", stats.method);
    if stats.count > 0 {
        let _ = writeln!(out, "  Range:  {:.4} - {:.4}", stats.min, stats.max);
        let _ = writeln!(
            out,
            "  Mean:   {:.4}  Median: {:.4}",
            stats.mean, stats.median
        );
        let _ = writeln!(out, "  StdDev: {:.4}", stats.std_dev);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Thresholds:");
    let _ = writeln!(out, "  Minor:  <= {:.4}", analysis.breakpoints.minor_threshold);
    let _ = writeln!(out, "  Major:  >  {:.4}", analysis.breakpoints.major_threshold);

    let tier_counts = count_tiers(&analysis.units);
    let _ = writeln!(out);
    let _ = writeln!(out, "Analysis Units: {} total", analysis.units.len());
    for (tier, count) in &tier_counts {
        let _ = writeln!(out, "  {tier}: {count}");
    }
    let inflections = analysis
        .units
        .iter()
        .filter(|u| u.is_inflection_point())
        .count();
    if inflections > 0 {
        let _ = writeln!(out, "  Inflection points (summary refresh): {inflections}");
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Estimated narration calls: {}",
        estimated_narration_calls(&analysis.units)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Planned Units:");
    for (i, unit) in analysis.units.iter().enumerate() {
        let marker = if unit.is_inflection_point() { " ***" } else { "" };
        let _ = writeln!(out, "  {}. {}{marker}", i + 1, unit.description);
    }

    out
}

/// Markdown evolution report assembled from the plan plus any narration
/// results the progress tracker has stored.
pub fn render_markdown(
    project: &str,
    labels: &[String],
    analysis: &TimelineAnalysis,
    progress: Option<&ProgressTracker>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Project History: {project}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "*Generated {}*",
        chrono::Utc::now().format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Overview");
    let _ = writeln!(out);
    match progress.and_then(|t| t.stable_summary()) {
        Some(summary) => {
            let _ = writeln!(out, "{}", opaque_text(summary));
        }
        None => {
            let _ = writeln!(out, "_No architectural summary has been generated yet._");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Change Statistics");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Total snapshots:** {}", labels.len());
    let _ = writeln!(out, "- **Analysis units:** {}", analysis.units.len());
    for (tier, count) in count_tiers(&analysis.units) {
        let _ = writeln!(out, "  - {}: {count}", tier.replace('_', " "));
    }
    if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
        let _ = writeln!(out, "- **Label range:** {first} to {last}");
    }
    let _ = writeln!(
        out,
        "- **Breakpoint method:** {}",
        analysis.breakpoints.distribution_stats.method
    );
    let _ = writeln!(
        out,
        "- **Thresholds:** minor <= {:.4}, major > {:.4}",
        analysis.breakpoints.minor_threshold, analysis.breakpoints.major_threshold
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Version History");
    let _ = writeln!(out);
    for (index, unit) in analysis.units.iter().enumerate() {
        render_unit(&mut out, index, unit, labels, analysis, progress);
    }

    out
}

fn render_unit(
    out: &mut String,
    index: usize,
    unit: &AnalysisUnit,
    labels: &[String],
    analysis: &TimelineAnalysis,
    progress: Option<&ProgressTracker>,
) {
    let fallback = |i: usize| i.to_string();
    let start = labels
        .get(unit.snapshot_range.0)
        .cloned()
        .unwrap_or_else(|| fallback(unit.snapshot_range.0));
    let end = labels
        .get(unit.snapshot_range.1)
        .cloned()
        .unwrap_or_else(|| fallback(unit.snapshot_range.1));

    let tier_marker = match unit.kind {
        UnitKind::Major { .. } => " (Major Change)",
        UnitKind::MinorBatch { .. } => " (Minor Changes)",
        _ => "",
    };
    let _ = writeln!(out, "### {start} -> {end}{tier_marker}");
    let _ = writeln!(out);

    let summary = FileChangeSummary::for_unit(unit, &analysis.diffs);
    let mut parts = Vec::new();
    if !summary.modified.is_empty() {
        parts.push(format!("{} modified", summary.modified.len()));
    }
    if !summary.added.is_empty() {
        parts.push(format!("{} added", summary.added.len()));
    }
    if !summary.removed.is_empty() {
        parts.push(format!("{} removed", summary.removed.len()));
    }
    if !summary.moved.is_empty() {
        parts.push(format!("{} moved", summary.moved.len()));
    }
    if !parts.is_empty() {
        let _ = writeln!(out, "**Files changed:** {}", parts.join(", "));
        let _ = writeln!(out);
    }

    match progress.and_then(|t| t.unit_result(index)) {
        Some(result) => {
            let _ = writeln!(out, "{}", opaque_text(result));
        }
        None => {
            let _ = writeln!(out, "_Not yet narrated._");
        }
    }
    let _ = writeln!(out);

    if !parts.is_empty() {
        let _ = writeln!(out, "<details><summary>File details</summary>");
        let _ = writeln!(out);
        summary.render_details(out);
        let _ = writeln!(out, "</details>");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out);
}

#[derive(Default)]
struct FileChangeSummary {
    modified: Vec<String>,
    added: Vec<String>,
    removed: Vec<String>,
    moved: Vec<String>,
}

impl FileChangeSummary {
    fn for_unit(unit: &AnalysisUnit, diffs: &[SnapshotDiff]) -> Self {
        let mut summary = Self::default();
        for &transition in unit.transitions() {
            let Some(diff) = diffs.get(transition) else {
                continue;
            };
            summary
                .modified
                .extend(diff.modified.iter().map(|fd| fd.path.clone()));
            summary.added.extend(diff.added.iter().cloned());
            summary.removed.extend(diff.removed.iter().cloned());
            summary
                .moved
                .extend(diff.moved.iter().map(|m| format!("{} -> {}", m.from, m.to)));
        }
        summary
    }

    fn render_details(&self, out: &mut String) {
        for (title, files) in [
            ("Modified", &self.modified),
            ("Added", &self.added),
            ("Removed", &self.removed),
            ("Moved", &self.moved),
        ] {
            if files.is_empty() {
                continue;
            }
            let _ = writeln!(out, "**{title}:**");
            for file in files {
                let _ = writeln!(out, "- {file}");
            }
            let _ = writeln!(out);
        }
    }
}

fn count_tiers(units: &[AnalysisUnit]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for unit in units {
        *counts.entry(unit.kind.name()).or_insert(0) += 1;
    }
    counts
}

/// Major units need structural, code, and synthesis passes; everything
/// else is a single call. Plus the initial summary and final overview.
fn estimated_narration_calls(units: &[AnalysisUnit]) -> usize {
    let per_unit: usize = units
        .iter()
        .map(|u| if u.is_inflection_point() { 3 } else { 1 })
        .sum();
    per_unit + 2
}

/// Render an opaque stored narration value: strings verbatim, objects
/// via their conventional `narrative` field, anything else as JSON.
fn opaque_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Object(map) => match map.get("narrative") {
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => serde_json::to_string_pretty(value).unwrap_or_default(),
        },
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap as Map;
    use strata_analysis::{find_breakpoints, plan_units};
    use strata_diff::{FileDiff, MovedFile};

    fn empty_diff() -> SnapshotDiff {
        SnapshotDiff {
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
            moved: Vec::new(),
            unchanged: Vec::new(),
            total_diff_lines: 0,
            files_changed_count: 0,
            new_file_listing: Vec::new(),
            total_lines_in_new: 0,
            status_docs: Map::new(),
            status_doc_diffs: Vec::new(),
        }
    }

    fn sample_analysis() -> TimelineAnalysis {
        let magnitudes = vec![0.01, 0.02, 0.60, 0.03, 0.58];
        let breakpoints = find_breakpoints(&magnitudes);
        let units = plan_units(&magnitudes, &breakpoints);

        let mut diffs: Vec<SnapshotDiff> = (0..5).map(|_| empty_diff()).collect();
        diffs[2].added = vec!["src/engine.rs".to_string()];
        diffs[2].modified = vec![FileDiff {
            path: "src/main.rs".to_string(),
            diff_lines: Vec::new(),
            diff_line_count: 40,
            non_text: false,
        }];
        diffs[2].moved = vec![MovedFile {
            from: "util.rs".to_string(),
            to: "src/util.rs".to_string(),
        }];
        diffs[2].files_changed_count = 3;

        TimelineAnalysis {
            diffs,
            magnitudes,
            breakpoints,
            units,
        }
    }

    #[test]
    fn plan_summary_lists_units_in_order() {
        let summary = summarize_plan(&sample_analysis());
        assert!(summary.contains("Analysis Plan Summary"));
        assert!(summary.contains("Analysis Units: 4 total"));
        assert!(summary.contains("minor_batch: 1"));
        assert!(summary.contains("Inflection points (summary refresh): 1"));
        assert!(summary.contains("1. Snapshots 0 -> 2 (2 minor transitions)"));
        assert!(summary.contains("***"));
    }

    #[test]
    fn narration_call_estimate_weights_majors() {
        let analysis = sample_analysis();
        // 3 for the major unit, 1 each for the other three, plus 2.
        assert_eq!(estimated_narration_calls(&analysis.units), 8);
    }

    #[test]
    fn markdown_report_without_progress_marks_units_unnarrated() {
        let labels: Vec<String> = (1..=6).map(|i| format!("000{i}")).collect();
        let report = render_markdown("Demo", &labels, &sample_analysis(), None);
        assert!(report.contains("# Project History: Demo"));
        assert!(report.contains("- **Total snapshots:** 6"));
        assert!(report.contains("- **Label range:** 0001 to 0006"));
        assert!(report.contains("### 0003 -> 0004 (Major Change)"));
        assert!(report.contains("_Not yet narrated._"));
        assert!(report.contains("_No architectural summary has been generated yet._"));
        assert!(report.contains("**Files changed:** 1 modified, 1 added, 1 moved"));
        assert!(report.contains("- util.rs -> src/util.rs"));
    }

    #[test]
    fn markdown_report_includes_stored_narration() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut tracker = ProgressTracker::open("demo", dir.path());
        tracker.initialize("hash", 6).unwrap();
        tracker
            .mark_unit_completed(1, json!({"narrative": "Rewrote the parsing engine."}))
            .unwrap();
        tracker
            .set_stable_summary(json!("A small CLI that parses logs."))
            .unwrap();

        let labels: Vec<String> = (1..=6).map(|i| format!("000{i}")).collect();
        let report = render_markdown("Demo", &labels, &sample_analysis(), Some(&tracker));
        assert!(report.contains("Rewrote the parsing engine."));
        assert!(report.contains("A small CLI that parses logs."));
        assert!(report.contains("_Not yet narrated._"));
    }

    #[test]
    fn opaque_values_render_sensibly() {
        assert_eq!(opaque_text(&json!("plain text")), "plain text");
        assert_eq!(
            opaque_text(&json!({"narrative": "from field"})),
            "from field"
        );
        assert!(opaque_text(&json!({"other": 1})).contains("\"other\""));
    }
}
