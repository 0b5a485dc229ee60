use crate::breakpoints::{find_breakpoints, BreakpointResult};
use crate::error::{AnalysisError, Result};
use crate::magnitude::magnitude;
use crate::planner::{plan_units, AnalysisUnit};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_diff::{diff_snapshots, DiffConfig, SnapshotDiff, SnapshotHandle};

/// Cooperative cancellation flag, checked at transition boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything the downstream narration step consumes: the per-transition
/// diffs, their magnitudes, the adaptive thresholds, and the ordered
/// analysis units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineAnalysis {
    pub diffs: Vec<SnapshotDiff>,
    pub magnitudes: Vec<f64>,
    pub breakpoints: BreakpointResult,
    pub units: Vec<AnalysisUnit>,
}

/// Diff every consecutive snapshot pair and plan the analysis units.
///
/// Sequential single pass: each transition is diffed independently, then
/// breakpoint detection runs as a barrier over the complete magnitude
/// list before units are planned. `on_transition` is invoked once per
/// completed transition with its index and magnitude. Cancellation is
/// honored between transitions; the in-flight transition's partial state
/// is discarded with its extraction workspaces.
pub fn analyze_timeline(
    snapshots: &[SnapshotHandle],
    config: &DiffConfig,
    cancel: &CancelFlag,
    mut on_transition: impl FnMut(usize, f64),
) -> Result<TimelineAnalysis> {
    let transition_count = snapshots.len().saturating_sub(1);
    let mut diffs = Vec::with_capacity(transition_count);
    let mut magnitudes = Vec::with_capacity(transition_count);

    for (index, pair) in snapshots.windows(2).enumerate() {
        if cancel.is_cancelled() {
            log::info!("cancelled before transition {index}; discarding partial analysis");
            return Err(AnalysisError::Cancelled);
        }

        let diff = diff_snapshots(&pair[0], &pair[1], config)?;
        let value = magnitude(&diff, diff.total_lines_in_new, diff.new_file_listing.len());
        log::debug!(
            "{} -> {}: magnitude {value:.4} ({} files changed, {} diff lines)",
            pair[0].label,
            pair[1].label,
            diff.files_changed_count,
            diff.total_diff_lines
        );
        on_transition(index, value);
        diffs.push(diff);
        magnitudes.push(value);
    }

    // Barrier: thresholds need the complete magnitude list.
    let breakpoints = find_breakpoints(&magnitudes);
    let units = plan_units(&magnitudes, &breakpoints);
    log::info!(
        "planned {} analysis units over {} transitions",
        units.len(),
        magnitudes.len()
    );

    Ok(TimelineAnalysis {
        diffs,
        magnitudes,
        breakpoints,
        units,
    })
}
