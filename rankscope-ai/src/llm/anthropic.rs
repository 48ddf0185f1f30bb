//! Anthropic Messages API client

use super::{summarize_error_body, GenerateOptions, Generation, LanguageModel, LlmError};
use crate::models::ModelId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "Anthropic";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

pub struct AnthropicModel {
    http: reqwest::Client,
    model: ModelId,
    api_key: String,
}

impl AnthropicModel {
    pub fn new(http: reqwest::Client, model: ModelId, api_key: String) -> Self {
        Self {
            http,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    fn model_id(&self) -> ModelId {
        self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, LlmError> {
        tracing::debug!(model = %self.model, max_tokens = options.max_tokens, "Generating with Anthropic");

        let body = MessagesRequest {
            model: self.model.as_str(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: options.system_prompt.as_deref(),
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: summarize_error_body(&error_text),
            });
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        let block = parsed
            .content
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER,
                message: "empty content".to_string(),
            })?;
        if block.kind != "text" {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER,
                message: format!("unexpected content type {}", block.kind),
            });
        }

        Ok(Generation {
            text: block.text,
            tokens_used: parsed.usage.map(|u| u.input_tokens + u.output_tokens),
        })
    }
}
