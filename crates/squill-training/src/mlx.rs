//! `mlx_lm` LoRA trainer backend.

use crate::error::{TrainingError, TrainingResult};
use crate::job::LoraJobSpec;
use crate::trainer::{AdapterArtifact, Trainer};
use async_trait::async_trait;
use chrono::Utc;
use std::process::Command;
use tracing::{error, info};

/// Trainer that shells out to `mlx_lm lora`.
#[derive(Debug, Clone)]
pub struct MlxLoraTrainer {
    /// Interpreter used to launch the trainer.
    program: String,
}

impl Default for MlxLoraTrainer {
    fn default() -> Self {
        Self { program: "python3".to_string() }
    }
}

impl MlxLoraTrainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the interpreter (tests use a stub).
    #[must_use]
    pub fn with_program(program: String) -> Self {
        Self { program }
    }

    /// Builds the full argument vector for one training run.
    ///
    /// Pure: the command line is a function of the job spec only.
    #[must_use]
    pub fn command_args(job: &LoraJobSpec) -> Vec<String> {
        vec![
            "-m".to_string(),
            "mlx_lm".to_string(),
            "lora".to_string(),
            "--model".to_string(),
            job.base_model.clone(),
            "--train".to_string(),
            "--data".to_string(),
            job.data_dir.display().to_string(),
            "--adapter-path".to_string(),
            job.adapter_dir.display().to_string(),
            "--iters".to_string(),
            job.hyperparams.iters.to_string(),
            "--batch-size".to_string(),
            job.hyperparams.batch_size.to_string(),
            "--num-layers".to_string(),
            job.hyperparams.num_layers.to_string(),
            "--max-seq-length".to_string(),
            job.hyperparams.max_seq_len.to_string(),
        ]
    }
}

#[async_trait]
impl Trainer for MlxLoraTrainer {
    fn id(&self) -> &'static str {
        "mlx-lora"
    }

    async fn run(&self, job: &LoraJobSpec) -> TrainingResult<AdapterArtifact> {
        job.validate()?;
        std::fs::create_dir_all(&job.adapter_dir)?;

        info!(model = %job.base_model, data = %job.data_dir.display(),
              adapter = %job.adapter_dir.display(), "starting LoRA fine-tuning");

        let status = Command::new(&self.program).args(Self::command_args(job)).status()?;
        if !status.success() {
            error!(code = ?status.code(), "mlx_lm lora failed");
            return Err(TrainingError::Trainer(format!(
                "mlx_lm lora exited with {:?}",
                status.code()
            )));
        }

        Ok(AdapterArtifact {
            adapter_dir: job.adapter_dir.clone(),
            base_model: job.base_model.clone(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn job(temp: &TempDir) -> LoraJobSpec {
        LoraJobSpec::new(
            "mlx-community/Llama-3.2-3B-Instruct-4bit".to_string(),
            temp.path().to_path_buf(),
            temp.path().join("adapters"),
        )
    }

    #[test]
    fn test_command_args_carry_all_hyperparams() {
        let temp = TempDir::new().unwrap();
        let args = MlxLoraTrainer::command_args(&job(&temp));

        assert_eq!(args[..3], ["-m", "mlx_lm", "lora"]);
        assert!(args.contains(&"--train".to_string()));
        let iters_idx = args.iter().position(|a| a == "--iters").unwrap();
        assert_eq!(args[iters_idx + 1], "50");
        let layers_idx = args.iter().position(|a| a == "--num-layers").unwrap();
        assert_eq!(args[layers_idx + 1], "16");
    }

    #[test]
    fn test_command_args_are_pure() {
        let temp = TempDir::new().unwrap();
        let spec = job(&temp);
        assert_eq!(MlxLoraTrainer::command_args(&spec), MlxLoraTrainer::command_args(&spec));
    }

    #[tokio::test]
    async fn test_run_with_stub_program_creates_adapter_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.jsonl"), "").unwrap();

        let trainer = MlxLoraTrainer::with_program("true".to_string());
        let artifact = trainer.run(&job(&temp)).await.unwrap();
        assert!(artifact.adapter_dir.exists());
        assert_eq!(artifact.base_model, "mlx-community/Llama-3.2-3B-Instruct-4bit");
    }

    #[tokio::test]
    async fn test_failing_program_propagates_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.jsonl"), "").unwrap();

        let trainer = MlxLoraTrainer::with_program("false".to_string());
        assert!(matches!(
            trainer.run(&job(&temp)).await,
            Err(TrainingError::Trainer(_))
        ));
    }

    #[test]
    fn test_invalid_spec_never_spawns() {
        let spec = LoraJobSpec::new(
            String::new(),
            PathBuf::from("/nonexistent"),
            PathBuf::from("/nonexistent/adapters"),
        );
        assert!(spec.validate().is_err());
    }
}
