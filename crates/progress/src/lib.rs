//! # Strata Progress
//!
//! Durable, crash-safe record of which analysis units the external
//! narration step has fully processed.
//!
//! State lives in `{state_dir}/{project}_progress.json` and is updated
//! atomically (write-new-then-replace) immediately after each unit
//! completes, so a crash loses at most the in-flight unit. The record is
//! keyed by a hash of the discovered snapshot set; when that set changes
//! the whole record is discarded — diffs and plans are cheap to
//! recompute, only externally-sourced narration results are worth
//! persisting.

mod error;
mod tracker;

pub use error::{ProgressError, Result};
pub use tracker::{compute_snapshots_hash, ProgressState, ProgressTracker};
