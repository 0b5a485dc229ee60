use crate::archive::{ExtractionWorkspace, SnapshotHandle};
use crate::config::DiffConfig;
use crate::error::Result;
use crate::inventory::{build_inventory, Inventory};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A modified file with its unified diff.
///
/// `diff_lines` holds the full unified diff (headers and context
/// included); `diff_line_count` counts only added/removed content lines
/// and is the unit magnitude scoring is scaled against. `non_text` marks
/// a hash-differing file no encoding could decode: kept in `modified`
/// with an empty diff rather than failing the comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub diff_lines: Vec<String>,
    pub diff_line_count: usize,
    #[serde(default)]
    pub non_text: bool,
}

impl FileDiff {
    fn non_text(path: &str) -> Self {
        Self {
            path: path.to_string(),
            diff_lines: Vec::new(),
            diff_line_count: 0,
            non_text: true,
        }
    }
}

/// A file relocated between snapshots, detected by matching content hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovedFile {
    pub from: String,
    pub to: String,
}

/// Complete diff between two snapshots.
///
/// Every path present in either inventory is classified into exactly one
/// of added, removed, modified, unchanged, moved-from, or moved-to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<FileDiff>,
    pub moved: Vec<MovedFile>,
    pub unchanged: Vec<String>,
    pub total_diff_lines: usize,
    pub files_changed_count: usize,
    /// All text paths in the newer snapshot.
    pub new_file_listing: Vec<String>,
    /// Total text lines in the newer snapshot; the size baseline that
    /// magnitude scoring normalizes against.
    pub total_lines_in_new: usize,
    pub status_docs: BTreeMap<String, String>,
    pub status_doc_diffs: Vec<FileDiff>,
}

/// Extract and diff two snapshot archives.
///
/// Both extraction workspaces are scoped to this call and removed on
/// every exit path.
pub fn diff_snapshots(
    old: &SnapshotHandle,
    new: &SnapshotHandle,
    config: &DiffConfig,
) -> Result<SnapshotDiff> {
    let old_workspace = ExtractionWorkspace::extract(old)?;
    let new_workspace = ExtractionWorkspace::extract(new)?;

    let old_inventory = build_inventory(old_workspace.root(), config)?;
    let new_inventory = build_inventory(new_workspace.root(), config)?;

    Ok(diff_inventories(&old_inventory, &new_inventory, config))
}

/// Compare two inventories. Pure and fully deterministic: identical
/// inputs always yield identical output, including move-pair order.
pub fn diff_inventories(
    old: &Inventory,
    new: &Inventory,
    config: &DiffConfig,
) -> SnapshotDiff {
    let only_old: Vec<&str> = old
        .keys()
        .filter(|p| !new.contains_key(*p))
        .map(String::as_str)
        .collect();
    let only_new: Vec<&str> = new
        .keys()
        .filter(|p| !old.contains_key(*p))
        .map(String::as_str)
        .collect();

    let (moved, moved_old, moved_new) = detect_moves(old, new, &only_old, &only_new);

    let added: Vec<String> = only_new
        .iter()
        .filter(|p| !moved_new.contains(**p))
        .map(|p| p.to_string())
        .collect();
    let removed: Vec<String> = only_old
        .iter()
        .filter(|p| !moved_old.contains(**p))
        .map(|p| p.to_string())
        .collect();

    let mut modified = Vec::new();
    let mut unchanged = Vec::new();
    for (path, old_entry) in old {
        let Some(new_entry) = new.get(path) else {
            continue;
        };
        if old_entry.hash == new_entry.hash {
            unchanged.push(path.clone());
            continue;
        }
        match (&old_entry.text, &new_entry.text) {
            (Some(old_text), Some(new_text)) => {
                modified.push(unified_file_diff(
                    old_text,
                    new_text,
                    path,
                    config.max_diff_lines,
                ));
            }
            _ => {
                log::debug!("{path}: content changed but is not decodable text");
                modified.push(FileDiff::non_text(path));
            }
        }
    }

    let total_diff_lines = modified.iter().map(|fd| fd.diff_line_count).sum();
    let files_changed_count = added.len() + removed.len() + modified.len() + moved.len();

    let new_file_listing: Vec<String> = new
        .iter()
        .filter(|(_, entry)| entry.is_text())
        .map(|(path, _)| path.clone())
        .collect();
    let total_lines_in_new = new.values().map(|entry| entry.line_count).sum();

    let mut status_docs = BTreeMap::new();
    for (path, entry) in new {
        if config.status_docs.matches(path) {
            if let Some(text) = &entry.text {
                status_docs.insert(path.clone(), text.clone());
            }
        }
    }
    let status_doc_diffs: Vec<FileDiff> = modified
        .iter()
        .filter(|fd| config.status_docs.matches(&fd.path))
        .cloned()
        .collect();

    // Partition invariant: every path in either inventory lands in
    // exactly one category.
    debug_assert_eq!(
        added.len() + removed.len() + modified.len() + unchanged.len() + moved.len() * 2,
        old.keys().chain(new.keys()).collect::<HashSet<_>>().len()
    );

    SnapshotDiff {
        added,
        removed,
        modified,
        moved,
        unchanged,
        total_diff_lines,
        files_changed_count,
        new_file_listing,
        total_lines_in_new,
        status_docs,
        status_doc_diffs,
    }
}

/// Reclassify removed/added pairs with matching content hashes as moves.
///
/// Hash groups are processed in the order first encountered while walking
/// the new inventory's paths ascending; within a group, removed and added
/// paths pair i-to-i in ascending lexical order. Surplus on either side
/// stays removed/added.
fn detect_moves<'a>(
    old: &'a Inventory,
    new: &'a Inventory,
    only_old: &[&'a str],
    only_new: &[&'a str],
) -> (Vec<MovedFile>, HashSet<&'a str>, HashSet<&'a str>) {
    let mut removed_by_hash: HashMap<&str, Vec<&str>> = HashMap::new();
    for path in only_old {
        removed_by_hash
            .entry(old[*path].hash.as_str())
            .or_default()
            .push(*path);
    }

    let mut group_order: Vec<&str> = Vec::new();
    let mut added_by_hash: HashMap<&str, Vec<&str>> = HashMap::new();
    for path in only_new {
        let hash = new[*path].hash.as_str();
        if !added_by_hash.contains_key(hash) {
            group_order.push(hash);
        }
        added_by_hash.entry(hash).or_default().push(*path);
    }

    let mut moved = Vec::new();
    let mut moved_old = HashSet::new();
    let mut moved_new = HashSet::new();
    for hash in group_order {
        let Some(old_group) = removed_by_hash.get(hash) else {
            continue;
        };
        // Both groups are in ascending lexical order already: they were
        // collected from sorted inventory traversals.
        for (from, to) in old_group.iter().zip(added_by_hash[hash].iter()) {
            moved.push(MovedFile {
                from: from.to_string(),
                to: to.to_string(),
            });
            moved_old.insert(*from);
            moved_new.insert(*to);
        }
    }

    (moved, moved_old, moved_new)
}

/// Line-based LCS diff of a modified text file.
fn unified_file_diff(old: &str, new: &str, path: &str, max_lines: usize) -> FileDiff {
    let diff = TextDiff::from_lines(old, new);
    let diff_line_count = diff
        .iter_all_changes()
        .filter(|change| matches!(change.tag(), ChangeTag::Insert | ChangeTag::Delete))
        .count();

    let mut diff_lines: Vec<String> = if diff_line_count > 0 {
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("a/{path}"), &format!("b/{path}"))
            .to_string()
            .lines()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    if max_lines > 0 && diff_lines.len() > max_lines {
        let truncated = diff_lines.len() - max_lines;
        diff_lines.truncate(max_lines);
        diff_lines.push(format!("... ({truncated} more lines truncated)"));
    }

    FileDiff {
        path: path.to_string(),
        diff_lines,
        diff_line_count,
        non_text: false,
    }
}
