use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExporterError>;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Judging error: {0}")]
    Judging(#[from] storage::services::JudgingError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}
