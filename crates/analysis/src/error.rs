use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Extraction(#[from] strata_diff::ExtractionError),

    /// Raised at a transition boundary after the cancellation flag was
    /// set; the in-flight transition is discarded, never partially kept.
    #[error("timeline analysis cancelled")]
    Cancelled,
}
