//! Provider configuration table.
//!
//! Each provider maps to a fixed endpoint, a default model, and a header
//! policy. Header construction is a pure function of the policy and the
//! stored credential.

use crate::ModelError;
use std::str::FromStr;

/// The API key variable consumed by the `Bearer` header policy.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Generation providers reachable over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI's hosted chat-completions API.
    OpenAi,
    /// LM Studio's local OpenAI-compatible server.
    LmStudio,
    /// Ollama's local chat API.
    Ollama,
    /// An exo cluster's OpenAI-compatible endpoint.
    Exo,
}

impl FromStr for Provider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "lmstudio" => Ok(Self::LmStudio),
            "ollama" => Ok(Self::Ollama),
            "exo" => Ok(Self::Exo),
            other => Err(ModelError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// How a provider authenticates requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Authorization: Bearer <credential>; the credential is required.
    Bearer,
    /// Local server, no credential.
    None,
}

/// Fixed per-provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_url: &'static str,
    pub default_model: &'static str,
    pub auth: AuthPolicy,
}

impl Provider {
    #[must_use]
    pub fn config(self) -> ProviderConfig {
        match self {
            Provider::OpenAi => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                default_model: "gpt-4",
                auth: AuthPolicy::Bearer,
            },
            Provider::LmStudio => ProviderConfig {
                api_url: "http://localhost:1234/v1/chat/completions",
                default_model: "mistral-7b-instruct",
                auth: AuthPolicy::None,
            },
            Provider::Ollama => ProviderConfig {
                api_url: "http://localhost:11434/api/chat",
                default_model: "phi",
                auth: AuthPolicy::None,
            },
            Provider::Exo => ProviderConfig {
                api_url: "http://127.0.0.1:52415/v1/chat/completions",
                default_model: "llama-3.2-1b",
                auth: AuthPolicy::None,
            },
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::LmStudio => "lmstudio",
            Provider::Ollama => "ollama",
            Provider::Exo => "exo",
        }
    }
}

/// Builds the request headers for an auth policy.
///
/// Pure: the same policy and credential always produce the same pairs.
///
/// # Errors
/// Returns `ModelError::UnsupportedProvider` when the policy requires a
/// credential and none is available.
pub fn request_headers(
    auth: AuthPolicy,
    credential: Option<&str>,
) -> Result<Vec<(&'static str, String)>, ModelError> {
    let mut headers = vec![("Content-Type", "application/json".to_string())];
    match auth {
        AuthPolicy::Bearer => {
            let credential = credential.ok_or_else(|| {
                ModelError::UnsupportedProvider(format!(
                    "{OPENAI_API_KEY_ENV} environment variable not set"
                ))
            })?;
            headers.push(("Authorization", format!("Bearer {credential}")));
        }
        AuthPolicy::None => {}
    }
    Ok(headers)
}
