use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProgressError>;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("failed to replace progress file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
