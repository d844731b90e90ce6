use squill_core::StorageError;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid fine-tuning job spec: {0}")]
    InvalidSpec(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("trainer error: {0}")]
    Trainer(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("cell sampling error: {0}")]
    Sampling(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
