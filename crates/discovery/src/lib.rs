//! # Strata Discovery
//!
//! Finds, parses, and chronologically orders zip snapshots for a project.
//!
//! Snapshot filenames are `{project}_{suffix}.zip`, where the suffix is
//! one of several conventions seen in real archives:
//!
//! ```text
//! Document_Analyzer_20250923b.zip     YYYYMMDD + optional letter
//! Mentorship_Database_20250909_1.zip  YYYYMMDD + _N sub-suffix
//! Document_Analyzer_250507.zip        YYMMDD
//! Accessibility_Shortcuts_22-08-01.zip  YY-MM-DD
//! Arduino_sketches_02-27-21.zip       MM-DD-YY
//! Arduino_sketches_8-14-21.zip        M-DD-YY
//! BrushTest_0001.zip                  incremental sequence
//! SimpleCCompiler_0.1.zip             dotted version
//! Media_Display_v1.zip                v-prefixed version
//! ```
//!
//! Versions order before sequence numbers, which order before dates, so
//! a project that migrated naming schemes still sorts sensibly.

mod error;
mod order;

pub use error::{DiscoveryError, Result};
pub use order::{parse_suffix, OrderKey};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One discovered snapshot archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub path: PathBuf,
    pub order_key: OrderKey,
    /// Human-readable label: the raw filename suffix.
    pub label: String,
    pub filename: String,
}

/// Find and chronologically sort all snapshots for `project` in `dir`.
///
/// Matching is case-insensitive on the project name. Errors if any
/// matching filename has an unparseable suffix, or if fewer than two
/// snapshots are found (one snapshot has no transitions to analyze).
pub fn discover_snapshots(dir: &Path, project: &str) -> Result<Vec<SnapshotInfo>> {
    if !dir.is_dir() {
        return Err(DiscoveryError::DirNotFound(dir.to_path_buf()));
    }

    let mut snapshots = Vec::new();
    let mut unparseable = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(suffix) = extract_suffix(&filename, project) else {
            continue;
        };
        match parse_suffix(&suffix) {
            Some(order_key) => snapshots.push(SnapshotInfo {
                path: entry.path(),
                order_key,
                label: suffix,
                filename,
            }),
            None => unparseable.push(filename),
        }
    }

    if !unparseable.is_empty() {
        unparseable.sort_unstable();
        return Err(DiscoveryError::UnparseableSuffixes { files: unparseable });
    }
    if snapshots.len() < 2 {
        return Err(DiscoveryError::TooFewSnapshots {
            project: project.to_string(),
            found: snapshots.len(),
            dir: dir.to_path_buf(),
        });
    }

    snapshots.sort_by(|a, b| {
        a.order_key
            .cmp(&b.order_key)
            .then_with(|| a.label.cmp(&b.label))
    });
    log::info!(
        "discovered {} snapshots for '{project}' in {}",
        snapshots.len(),
        dir.display()
    );
    Ok(snapshots)
}

/// Scan a directory and list every project name that has two or more
/// parseable snapshots, with its snapshot count.
pub fn list_projects(dir: &Path) -> Result<BTreeMap<String, usize>> {
    if !dir.is_dir() {
        return Err(DiscoveryError::DirNotFound(dir.to_path_buf()));
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = strip_zip_extension(&filename) else {
            continue;
        };

        // Try progressively shorter name prefixes until the remainder
        // parses as a suffix.
        let mut split_end = stem.len();
        while let Some(idx) = stem[..split_end].rfind('_') {
            if idx == 0 {
                break;
            }
            if parse_suffix(&stem[idx + 1..]).is_some() {
                *counts.entry(stem[..idx].to_lowercase()).or_insert(0) += 1;
                break;
            }
            split_end = idx;
        }
    }

    counts.retain(|_, count| *count >= 2);
    Ok(counts)
}

fn strip_zip_extension(filename: &str) -> Option<&str> {
    if filename.len() < 4 {
        return None;
    }
    let (stem, ext) = filename.split_at(filename.len() - 4);
    ext.eq_ignore_ascii_case(".zip").then_some(stem)
}

/// Extract the suffix from `{project}_{suffix}.zip`, case-insensitive on
/// the project name.
fn extract_suffix(filename: &str, project: &str) -> Option<String> {
    let stem = strip_zip_extension(filename)?;
    if stem.len() <= project.len() + 1 || !stem.is_char_boundary(project.len()) {
        return None;
    }
    let (name_part, rest) = stem.split_at(project.len());
    if !name_part.eq_ignore_ascii_case(project) || !rest.starts_with('_') {
        return None;
    }
    Some(rest[1..].to_string())
}
