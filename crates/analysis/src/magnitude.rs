use strata_diff::SnapshotDiff;

/// Weight of the line-churn ratio.
pub const W_LINE: f64 = 0.4;
/// Weight of the structural-churn ratio. Structural churn (file-level
/// additions, removals, moves) signals larger conceptual change than
/// proportionally equal line edits, so it never weighs less than lines.
pub const W_STRUCT: f64 = 0.6;

/// Normalized change magnitude for one transition, in [0, 1].
///
/// Total: never fails. A zero-line or zero-file project yields ratio 0
/// for the corresponding term rather than a division error.
pub fn magnitude(diff: &SnapshotDiff, total_project_lines: usize, total_files: usize) -> f64 {
    let diff_ratio = ratio(diff.total_diff_lines, total_project_lines);
    let structural_changes = diff.added.len() + diff.removed.len() + diff.moved.len();
    let structural_ratio = ratio(structural_changes, total_files);

    (W_LINE * diff_ratio + W_STRUCT * structural_ratio).clamp(0.0, 1.0)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64).clamp(0.0, 1.0)
}
