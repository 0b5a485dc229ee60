use crate::error::{ExtractionError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An ordered snapshot: a human-readable label plus the archive holding
/// its full file tree. Produced by discovery; read-only input to diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub label: String,
    pub archive: PathBuf,
}

impl SnapshotHandle {
    pub fn new(label: impl Into<String>, archive: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            archive: archive.into(),
        }
    }
}

/// A snapshot archive unpacked into a scoped temporary directory.
///
/// The directory is removed when the workspace is dropped, on every exit
/// path including hashing failures mid-inventory.
#[derive(Debug)]
pub struct ExtractionWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

impl ExtractionWorkspace {
    /// Extract `handle`'s archive. Fails with [`ExtractionError`] if the
    /// archive is missing, unreadable, or structurally invalid.
    pub fn extract(handle: &SnapshotHandle) -> Result<Self> {
        if !handle.archive.is_file() {
            return Err(ExtractionError::ArchiveNotFound(handle.archive.clone()));
        }

        let temp = TempDir::new()?;
        let file = fs::File::open(&handle.archive)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractionError::Archive {
            path: handle.archive.clone(),
            source,
        })?;
        archive
            .extract(temp.path())
            .map_err(|source| ExtractionError::Archive {
                path: handle.archive.clone(),
                source,
            })?;

        let root = content_root(temp.path())?;
        log::debug!(
            "extracted {} ({} -> {})",
            handle.label,
            handle.archive.display(),
            root.display()
        );
        Ok(Self { _temp: temp, root })
    }

    /// Effective project root inside the workspace, with any single
    /// wrapper directory already stripped.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Find the effective root after extraction.
///
/// Many archives wrap all content in a single top-level directory; paths
/// must stay comparable across snapshots that differ only in that wrapper.
fn content_root(extract_dir: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(extract_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == "__MACOSX" {
            continue;
        }
        entries.push(entry.path());
    }

    if let [single] = entries.as_slice() {
        if single.is_dir() {
            return Ok(single.clone());
        }
    }
    Ok(extract_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn strips_single_wrapper_directory() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("snap.zip");
        write_zip(
            &zip_path,
            &[("project-1.0/src/main.rs", "fn main() {}\n")],
        );

        let workspace =
            ExtractionWorkspace::extract(&SnapshotHandle::new("snap", &zip_path)).unwrap();
        assert!(workspace.root().ends_with("project-1.0"));
        assert!(workspace.root().join("src/main.rs").is_file());
    }

    #[test]
    fn keeps_root_with_multiple_top_level_entries() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("snap.zip");
        write_zip(&zip_path, &[("a.txt", "a\n"), ("b/c.txt", "c\n")]);

        let workspace =
            ExtractionWorkspace::extract(&SnapshotHandle::new("snap", &zip_path)).unwrap();
        assert!(workspace.root().join("a.txt").is_file());
        assert!(workspace.root().join("b/c.txt").is_file());
    }

    #[test]
    fn missing_archive_is_an_extraction_error() {
        let err =
            ExtractionWorkspace::extract(&SnapshotHandle::new("gone", "/nonexistent/snap.zip"))
                .unwrap_err();
        assert!(matches!(err, ExtractionError::ArchiveNotFound(_)));
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("bad.zip");
        fs::write(&zip_path, b"this is not a zip file").unwrap();

        let err = ExtractionWorkspace::extract(&SnapshotHandle::new("bad", &zip_path)).unwrap_err();
        assert!(matches!(err, ExtractionError::Archive { .. }));
    }

    #[test]
    fn workspace_directory_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("snap.zip");
        write_zip(&zip_path, &[("a.txt", "a\n")]);

        let extracted_root = {
            let workspace =
                ExtractionWorkspace::extract(&SnapshotHandle::new("snap", &zip_path)).unwrap();
            workspace.root().to_path_buf()
        };
        assert!(!extracted_root.exists());
    }
}
