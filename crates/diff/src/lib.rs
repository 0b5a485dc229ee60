//! # Strata Diff
//!
//! Content-addressed comparison of snapshot archives.
//!
//! ## Pipeline
//!
//! ```text
//! Snapshot archive (zip)
//!     │
//!     ├──> Extraction workspace (scoped temp dir, wrapper dir stripped)
//!     │      └─> Inventory (path -> hash / text)
//!     │
//!     └──> Diff engine (per consecutive pair)
//!            └─> SnapshotDiff (added / removed / modified / moved / unchanged)
//! ```
//!
//! Diffing is a pure function of the two inventories: identical inputs
//! always produce identical output, including the pairing order of
//! detected moves.

mod archive;
mod config;
mod engine;
mod error;
mod inventory;
mod status_docs;

pub use archive::{ExtractionWorkspace, SnapshotHandle};
pub use config::{DiffConfig, DEFAULT_BINARY_EXTENSIONS};
pub use engine::{diff_inventories, diff_snapshots, FileDiff, MovedFile, SnapshotDiff};
pub use error::{ExtractionError, Result};
pub use inventory::{build_inventory, FileEntry, Inventory};
pub use status_docs::{StatusDocMatcher, DEFAULT_STATUS_DOC_NAMES, DEFAULT_STATUS_DOC_PATTERNS};
