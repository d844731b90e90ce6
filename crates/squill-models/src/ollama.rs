//! Ollama model implementation.
//!
//! Ollama's `/api/chat` shape differs from the OpenAI-compatible providers,
//! so it gets its own client.

use crate::provider::Provider;
use crate::{Model, ModelError, ModelParameters, ModelResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Ollama model implementation.
#[derive(Debug, Clone)]
pub struct OllamaModel {
    /// The model ID (e.g., "phi", "codellama:13b").
    model_id: String,
    /// The full chat endpoint URL.
    api_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OllamaModel {
    /// Creates a new `OllamaModel`, defaulting the model ID from the
    /// provider table.
    #[must_use]
    pub fn new(model_id: Option<String>) -> Self {
        let config = Provider::Ollama.config();
        Self::with_endpoint(
            model_id.unwrap_or_else(|| config.default_model.to_string()),
            config.api_url.to_string(),
        )
    }

    /// Creates a new `OllamaModel` against an explicit endpoint.
    #[must_use]
    pub fn with_endpoint(model_id: String, api_url: String) -> Self {
        Self { model_id, api_url, client: Client::new() }
    }
}

// Ollama API request/response structures

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>, // max_tokens equivalent
}

#[derive(Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

impl OllamaModel {
    fn build_options(parameters: Option<ModelParameters>) -> Option<OllamaOptions> {
        parameters.map(|p| OllamaOptions {
            temperature: p.temperature,
            top_p: p.top_p,
            num_predict: p.max_tokens,
        })
    }
}

#[async_trait]
impl Model for OllamaModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            prompt_len = prompt.len(),
            "OllamaModel generating text"
        );

        let request_body = OllamaChatRequest {
            model: self.model_id.clone(),
            messages: vec![OllamaMessage { role: "user".to_string(), content: prompt.to_string() }],
            stream: false,
            options: Self::build_options(parameters),
        };

        let response =
            self.client.post(&self.api_url).json(&request_body).send().await.map_err(|e| {
                error!(error = %e, api_url = %self.api_url, "failed to connect to Ollama");
                if e.is_connect() {
                    ModelError::RequestError(format!(
                        "Ollama server not reachable at {}. Start it with 'ollama serve'.",
                        self.api_url
                    ))
                } else {
                    ModelError::RequestError(format!("Network error: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Ollama API returned error status");
            if status == 404 {
                return Err(ModelError::ModelResponseError(format!(
                    "Model '{}' not found. Pull it with 'ollama pull {}'.",
                    self.model_id, self.model_id
                )));
            }
            return Err(ModelError::ModelResponseError(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse Ollama response");
            ModelError::SerializationError(format!("Failed to parse response: {e}"))
        })?;

        Ok(ModelResponse {
            content: chat_response.message.content,
            model_id: Some(self.model_id.clone()),
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
