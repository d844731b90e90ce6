use crate::error::TrainingResult;
use crate::job::LoraJobSpec;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The adapter a successful fine-tuning run leaves on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterArtifact {
    pub adapter_dir: PathBuf,
    pub base_model: String,
    pub created_at: DateTime<Utc>,
}

/// A fine-tuning backend. Training semantics belong entirely to the
/// backend; failures propagate as-is with no retry.
#[async_trait]
pub trait Trainer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn run(&self, job: &LoraJobSpec) -> TrainingResult<AdapterArtifact>;
}
