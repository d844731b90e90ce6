//! Model backends for batch inference.
//!
//! This crate defines the `Model` seam and its concrete implementations:
//!
//! - **ChatCompletionsModel**: OpenAI-compatible HTTP endpoints (openai,
//!   lmstudio, exo)
//! - **OllamaModel**: the Ollama local chat API
//! - **MlxModel**: a local `mlx_lm` generate subprocess, with adapter support
//! - **MockModel**: testing and development

pub mod batch;
pub mod chat;
pub mod mlx;
pub mod ollama;
pub mod provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use batch::{
    BatchSummary, PredictionResult, PredictionStatus, load_prompts, normalize_response,
    run_batch, write_predictions,
};
pub use chat::ChatCompletionsModel;
pub use mlx::MlxModel;
pub use ollama::OllamaModel;
pub use provider::{AuthPolicy, Provider, ProviderConfig, request_headers};

/// Represents an error that can occur when running a model backend.
#[derive(Error, Debug)]
pub enum ModelError {
    /// An error occurred during the API request (network, connect, timeout).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The backend returned an error response or no usable content.
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The provider is not supported or not fully configured.
    #[error("Unsupported Provider: {0}")]
    UnsupportedProvider(String),

    /// I/O error (prompt files, prediction files, subprocess spawning).
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for controlling generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass.
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sequences where generation stops.
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(1.0),
            max_tokens: Some(512),
            stop_sequences: None,
        }
    }
}

/// The response from one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated content, unnormalized.
    pub content: String,

    /// The ID of the model that produced the response, when reported.
    pub model_id: Option<String>,
}

/// A text-generation backend.
///
/// Backends wrap the prompt into their own chat format; callers hand over
/// one prompt and receive one completion.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails. Batch callers capture the
    /// error per prompt and continue.
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

/// A mock implementation of the `Model` trait for testing and demonstration.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
    fail_marker: Option<String>,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self { id, fail_marker: None }
    }

    /// Creates a mock that fails on any prompt containing `marker`, for
    /// exercising partial-failure batch behavior.
    #[must_use]
    pub fn failing_on(id: String, marker: String) -> Self {
        Self { id, fail_marker: Some(marker) }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "MockModel generating text"
        );

        if let Some(marker) = &self.fail_marker {
            if prompt.contains(marker.as_str()) {
                return Err(ModelError::ModelResponseError(format!(
                    "mock failure triggered by marker {marker:?}"
                )));
            }
        }

        Ok(ModelResponse {
            content: format!("Mock response for: {prompt}"),
            model_id: Some(self.id.clone()),
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}
