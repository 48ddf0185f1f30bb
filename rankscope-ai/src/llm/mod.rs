//! Generative model clients
//!
//! The pipeline only sees [`LanguageModel`]; provider wire formats stay in
//! the `anthropic` and `openai` modules. A [`ModelFactory`] turns the
//! request's [`ModelId`] into a client, so tests can hand the orchestrator
//! scripted models.

mod anthropic;
mod openai;

pub use anthropic::AnthropicModel;
pub use openai::OpenAiModel;

use crate::models::{ModelId, Provider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Upper bound on a single provider call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} environment variable is not set")]
    MissingApiKey(&'static str),

    #[error("{provider} API request failed: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

impl LlmError {
    /// Configuration problem rather than a failed call
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingApiKey(_))
    }
}

/// Per-call generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }
}

impl GenerateOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub tokens_used: Option<u64>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> ModelId;

    async fn generate(&self, prompt: &str, options: &GenerateOptions)
        -> Result<Generation, LlmError>;
}

/// Builds a client for a requested model
pub trait ModelFactory: Send + Sync {
    fn create(&self, model: ModelId) -> Result<Arc<dyn LanguageModel>, LlmError>;
}

/// HTTP-backed factory holding the configured provider keys
pub struct ProviderModelFactory {
    http: reqwest::Client,
    anthropic_api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl ProviderModelFactory {
    pub fn new(
        anthropic_api_key: Option<String>,
        openai_api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Network {
                provider: "HTTP",
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            anthropic_api_key,
            openai_api_key,
        })
    }
}

impl ModelFactory for ProviderModelFactory {
    fn create(&self, model: ModelId) -> Result<Arc<dyn LanguageModel>, LlmError> {
        match model.provider() {
            Provider::Anthropic => {
                let key = self
                    .anthropic_api_key
                    .clone()
                    .ok_or(LlmError::MissingApiKey("ANTHROPIC_API_KEY"))?;
                Ok(Arc::new(AnthropicModel::new(self.http.clone(), model, key)))
            }
            Provider::OpenAi => {
                let key = self
                    .openai_api_key
                    .clone()
                    .ok_or(LlmError::MissingApiKey("OPENAI_API_KEY"))?;
                Ok(Arc::new(OpenAiModel::new(self.http.clone(), model, key)))
            }
        }
    }
}

/// Short, payload-free description of a provider error body
pub(crate) fn summarize_error_body(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect());
    message.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let factory = ProviderModelFactory::new(None, Some("sk-test".to_string())).unwrap();
        let err = factory.create(ModelId::ClaudeSonnet45).err().unwrap();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "ANTHROPIC_API_KEY environment variable is not set");

        let model = factory.create(ModelId::Gpt4Turbo).unwrap();
        assert_eq!(model.model_id(), ModelId::Gpt4Turbo);
    }

    #[test]
    fn test_default_options() {
        let options = GenerateOptions::default();
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.max_tokens, 4096);
        assert!(options.system_prompt.is_none());
    }

    #[test]
    fn test_error_body_summary_prefers_message() {
        let body = r#"{"error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(summarize_error_body(body), "Overloaded");
        assert_eq!(summarize_error_body("plain failure"), "plain failure");
    }
}
