use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Failure to open or unpack a snapshot archive.
///
/// Fatal for the transition being computed: no partial diff is ever
/// produced from a snapshot that could not be fully inventoried.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("snapshot archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("failed to read archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
