use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// LoRA hyperparameters handed to the external trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraHyperParams {
    /// Training iterations.
    pub iters: u32,
    /// Batch size.
    pub batch_size: u32,
    /// Number of layers the adapter tunes.
    pub num_layers: u32,
    /// Maximum sequence length.
    pub max_seq_len: u32,
}

impl Default for LoraHyperParams {
    fn default() -> Self {
        Self { iters: 50, batch_size: 2, num_layers: 16, max_seq_len: 2048 }
    }
}

impl LoraHyperParams {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.iters == 0 {
            return Err(TrainingError::InvalidSpec("iters must be >= 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidSpec("batch_size must be >= 1".to_string()));
        }
        if self.num_layers == 0 {
            return Err(TrainingError::InvalidSpec("num_layers must be >= 1".to_string()));
        }
        if self.max_seq_len == 0 {
            return Err(TrainingError::InvalidSpec("max_seq_len must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// One fine-tuning job: base model, data directory with the builder's
/// train/valid splits, and the adapter output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoraJobSpec {
    pub base_model: String,
    pub data_dir: PathBuf,
    pub adapter_dir: PathBuf,
    pub hyperparams: LoraHyperParams,
}

impl LoraJobSpec {
    #[must_use]
    pub fn new(base_model: String, data_dir: PathBuf, adapter_dir: PathBuf) -> Self {
        Self { base_model, data_dir, adapter_dir, hyperparams: LoraHyperParams::default() }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.base_model.trim().is_empty() {
            return Err(TrainingError::InvalidSpec("base_model is required".to_string()));
        }
        if !self.data_dir.join("train.jsonl").exists() {
            return Err(TrainingError::InvalidSpec(format!(
                "data directory {} has no train.jsonl",
                self.data_dir.display()
            )));
        }
        self.hyperparams.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_hyperparams() {
        let params = LoraHyperParams::default();
        assert_eq!(params.iters, 50);
        assert_eq!(params.batch_size, 2);
        assert_eq!(params.num_layers, 16);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_hyperparams_rejected() {
        let params = LoraHyperParams { iters: 0, ..LoraHyperParams::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_spec_requires_base_model_and_train_file() {
        let temp = TempDir::new().unwrap();
        let spec = LoraJobSpec::new(
            "".to_string(),
            temp.path().to_path_buf(),
            temp.path().join("adapters"),
        );
        assert!(spec.validate().is_err());

        let mut spec = spec;
        spec.base_model = "mlx-community/Llama-3.2-3B-Instruct-4bit".to_string();
        assert!(spec.validate().is_err(), "missing train.jsonl must be rejected");

        std::fs::write(temp.path().join("train.jsonl"), "").unwrap();
        assert!(spec.validate().is_ok());
    }
}
