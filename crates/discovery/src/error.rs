use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("snapshot directory not found: {}", .0.display())]
    DirNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "found {} matching zip file(s) with unparseable suffixes:\n  {}",
        .files.len(),
        .files.join("\n  ")
    )]
    UnparseableSuffixes { files: Vec<String> },

    #[error(
        "need at least 2 snapshots for project '{project}', found {found} in {}",
        .dir.display()
    )]
    TooFewSnapshots {
        project: String,
        found: usize,
        dir: PathBuf,
    },
}
