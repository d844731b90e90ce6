//! Local `mlx_lm` generate backend.
//!
//! Runs one `mlx_lm generate` subprocess per prompt. This is the only
//! backend that can load a saved adapter next to the base model; the HTTP
//! providers serve whatever the remote process has loaded.

use crate::{Model, ModelError, ModelParameters, ModelResponse};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, error};

/// Model backend that shells out to `mlx_lm generate`.
#[derive(Debug, Clone)]
pub struct MlxModel {
    /// The model ID (e.g., "mlx-community/Llama-3.2-3B-Instruct-4bit").
    model_id: String,
    /// Optional adapter directory produced by a fine-tuning run.
    adapter_path: Option<PathBuf>,
    /// Interpreter used to launch the generator.
    program: String,
}

impl MlxModel {
    #[must_use]
    pub fn new(model_id: String, adapter_path: Option<PathBuf>) -> Self {
        Self { model_id, adapter_path, program: "python3".to_string() }
    }

    /// Overrides the interpreter (tests use a stub).
    #[must_use]
    pub fn with_program(mut self, program: String) -> Self {
        self.program = program;
        self
    }

    /// Builds the full argument vector for one generation call.
    ///
    /// Pure: the command line is a function of the model, adapter, prompt,
    /// and parameters only.
    #[must_use]
    pub fn command_args(&self, prompt: &str, parameters: &ModelParameters) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            "mlx_lm".to_string(),
            "generate".to_string(),
            "--model".to_string(),
            self.model_id.clone(),
        ];
        if let Some(adapter) = &self.adapter_path {
            args.push("--adapter-path".to_string());
            args.push(adapter.display().to_string());
        }
        if let Some(max_tokens) = parameters.max_tokens {
            args.push("--max-tokens".to_string());
            args.push(max_tokens.to_string());
        }
        if let Some(temperature) = parameters.temperature {
            args.push("--temp".to_string());
            args.push(temperature.to_string());
        }
        if let Some(top_p) = parameters.top_p {
            args.push("--top-p".to_string());
            args.push(top_p.to_string());
        }
        args.push("--prompt".to_string());
        args.push(prompt.to_string());
        args
    }
}

#[async_trait]
impl Model for MlxModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        let parameters = parameters.unwrap_or_default();
        debug!(
            model_id = %self.model_id,
            adapter = ?self.adapter_path,
            prompt_len = prompt.len(),
            "MlxModel generating text"
        );

        let output = Command::new(&self.program)
            .args(self.command_args(prompt, &parameters))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = ?output.status.code(), "mlx_lm generate failed");
            return Err(ModelError::ModelResponseError(format!(
                "mlx_lm generate exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(ModelResponse {
            content: String::from_utf8_lossy(&output.stdout).into_owned(),
            model_id: Some(self.model_id.clone()),
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
