//! OpenAI-compatible chat-completions client.
//!
//! Covers every provider that speaks the `/v1/chat/completions` shape:
//! openai, lmstudio, and exo. The single prompt is wrapped as one user
//! message, matching how the fine-tuned prompts were built.

use crate::provider::{Provider, request_headers};
use crate::{Model, ModelError, ModelParameters, ModelResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

/// Chat-completions model over an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    /// The model ID sent in the request body.
    model_id: String,
    /// The full chat-completions endpoint URL.
    api_url: String,
    /// Precomputed request headers.
    headers: Vec<(&'static str, String)>,
    /// HTTP client for making requests.
    client: Client,
}

impl ChatCompletionsModel {
    /// Creates a model for a configured provider.
    ///
    /// The model ID falls back to the provider's default; the credential for
    /// bearer-auth providers is read from `OPENAI_API_KEY`.
    ///
    /// # Errors
    /// Returns a `ModelError` if the provider requires a credential that is
    /// not set.
    pub fn for_provider(provider: Provider, model_id: Option<String>) -> Result<Self, ModelError> {
        let config = provider.config();
        let credential = env::var(crate::provider::OPENAI_API_KEY_ENV).ok();
        let headers = request_headers(config.auth, credential.as_deref())?;
        Ok(Self {
            model_id: model_id.unwrap_or_else(|| config.default_model.to_string()),
            api_url: config.api_url.to_string(),
            headers,
            client: Client::new(),
        })
    }

    /// Creates a model against an explicit endpoint with no auth. Used for
    /// tests and ad-hoc local servers.
    #[must_use]
    pub fn with_endpoint(model_id: String, api_url: String) -> Self {
        Self {
            model_id,
            api_url,
            headers: vec![("Content-Type", "application/json".to_string())],
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Model for ChatCompletionsModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            prompt_len = prompt.len(),
            "ChatCompletionsModel generating text"
        );

        let mut request_body = ChatRequest {
            model: self.model_id.clone(),
            messages: vec![ChatRequestMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };
        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
        }

        let mut request = self.client.post(&self.api_url).json(&request_body);
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, api_url = %self.api_url, "failed to reach chat endpoint");
            if e.is_connect() {
                ModelError::RequestError(format!("endpoint not reachable at {}", self.api_url))
            } else {
                ModelError::RequestError(format!("Network error: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "chat endpoint returned error status");
            return Err(ModelError::ModelResponseError(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse chat response");
            ModelError::SerializationError(format!("Failed to parse response: {e}"))
        })?;

        let content = chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                ModelError::ModelResponseError("No content in API response".to_string())
            })?;

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()) })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Chat-completions request/response structures

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatRequestMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_text_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "SELECT count(*) FROM farm"}}]}"#,
            )
            .create_async()
            .await;

        let model = ChatCompletionsModel::with_endpoint(
            "test-model".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let response = model.generate_text("How many farms?", None).await.unwrap();
        assert_eq!(response.content, "SELECT count(*) FROM farm");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_model_response_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let model = ChatCompletionsModel::with_endpoint(
            "test-model".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let err = model.generate_text("q", None).await.unwrap_err();
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let model = ChatCompletionsModel::with_endpoint(
            "test-model".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        assert!(model.generate_text("q", None).await.is_err());
    }

    #[test]
    fn test_default_model_from_provider_table() {
        let model =
            ChatCompletionsModel::for_provider(Provider::Exo, None).expect("exo needs no key");
        assert_eq!(model.model_id(), "llama-3.2-1b");
    }
}
