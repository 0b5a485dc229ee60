use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Persisted progress record for one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressState {
    pub project: String,
    pub snapshots_hash: String,
    pub snapshot_count: usize,
    #[serde(default)]
    pub completed_units: BTreeSet<usize>,
    /// Opaque per-unit narration results, keyed by unit index.
    #[serde(default)]
    pub unit_results: BTreeMap<usize, serde_json::Value>,
    /// Opaque cached architectural summary, refreshed at inflection
    /// points by the narration step.
    #[serde(default)]
    pub stable_summary: Option<serde_json::Value>,
    #[serde(default)]
    pub last_updated: String,
}

/// Hash of the ordered snapshot set: each snapshot's label plus the
/// content hash of its archive. Any change to the set invalidates
/// persisted progress wholesale.
pub fn compute_snapshots_hash<'a, I>(snapshots: I) -> io::Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a Path)>,
{
    let mut hasher = Sha256::new();
    for (label, archive) in snapshots {
        hasher.update(label.as_bytes());
        hasher.update([0u8]);
        let mut file = fs::File::open(archive)?;
        io::copy(&mut file, &mut hasher)?;
        hasher.update([0u8]);
    }
    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..16].to_string())
}

/// Tracks narration progress for a single project.
pub struct ProgressTracker {
    project: String,
    state_dir: PathBuf,
    progress_file: PathBuf,
    state: ProgressState,
}

impl ProgressTracker {
    /// Load the persisted record if one exists. A missing, unreadable,
    /// or corrupt record is a cache miss, never an error.
    pub fn open(project: &str, state_dir: &Path) -> Self {
        let progress_file = state_dir.join(format!("{project}_progress.json"));
        let state = match fs::read(&progress_file) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(err) => {
                    log::warn!(
                        "corrupt progress file {}, starting fresh: {err}",
                        progress_file.display()
                    );
                    ProgressState::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => ProgressState::default(),
            Err(err) => {
                log::warn!(
                    "unreadable progress file {}, starting fresh: {err}",
                    progress_file.display()
                );
                ProgressState::default()
            }
        };

        Self {
            project: project.to_string(),
            state_dir: state_dir.to_path_buf(),
            progress_file,
            state,
        }
    }

    /// Whether the persisted record belongs to the given snapshot set.
    pub fn is_valid_for(&self, snapshots_hash: &str) -> bool {
        !self.state.snapshots_hash.is_empty() && self.state.snapshots_hash == snapshots_hash
    }

    /// Reset the record for a new snapshot set, discarding completed
    /// units, cached narration results, and the cached summary.
    pub fn initialize(&mut self, snapshots_hash: &str, snapshot_count: usize) -> Result<()> {
        self.state = ProgressState {
            project: self.project.clone(),
            snapshots_hash: snapshots_hash.to_string(),
            snapshot_count,
            ..ProgressState::default()
        };
        self.save()
    }

    pub fn is_unit_completed(&self, unit_index: usize) -> bool {
        self.state.completed_units.contains(&unit_index)
    }

    /// Record a unit's narration result durably, before the next unit
    /// begins.
    pub fn mark_unit_completed(
        &mut self,
        unit_index: usize,
        result: serde_json::Value,
    ) -> Result<()> {
        self.state.completed_units.insert(unit_index);
        self.state.unit_results.insert(unit_index, result);
        self.save()
    }

    pub fn unit_result(&self, unit_index: usize) -> Option<&serde_json::Value> {
        self.state.unit_results.get(&unit_index)
    }

    pub fn all_results(&self) -> &BTreeMap<usize, serde_json::Value> {
        &self.state.unit_results
    }

    pub fn stable_summary(&self) -> Option<&serde_json::Value> {
        self.state.stable_summary.as_ref()
    }

    pub fn set_stable_summary(&mut self, summary: serde_json::Value) -> Result<()> {
        self.state.stable_summary = Some(summary);
        self.save()
    }

    pub fn completed_count(&self) -> usize {
        self.state.completed_units.len()
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Delete the persisted record and reset in-memory state.
    pub fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.progress_file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        self.state = ProgressState::default();
        Ok(())
    }

    pub fn status_line(&self, total_units: usize) -> String {
        let summary = if self.state.stable_summary.is_some() {
            "cached"
        } else {
            "not yet generated"
        };
        format!(
            "Progress: {}/{} units completed, architectural summary {}",
            self.completed_count(),
            total_units,
            summary
        )
    }

    /// Atomic write-new-then-replace: a crash mid-save never corrupts a
    /// previously committed record.
    fn save(&mut self) -> Result<()> {
        fs::create_dir_all(&self.state_dir)?;
        self.state.last_updated = chrono::Utc::now().to_rfc3339();

        let tmp = tempfile::NamedTempFile::new_in(&self.state_dir)?;
        serde_json::to_writer_pretty(&tmp, &self.state)?;
        tmp.persist(&self.progress_file)?;
        Ok(())
    }
}
