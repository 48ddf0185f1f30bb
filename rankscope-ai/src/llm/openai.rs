//! OpenAI Chat Completions client

use super::{summarize_error_body, GenerateOptions, Generation, LanguageModel, LlmError};
use crate::models::ModelId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const PROVIDER: &str = "OpenAI";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

pub struct OpenAiModel {
    http: reqwest::Client,
    model: ModelId,
    api_key: String,
}

impl OpenAiModel {
    pub fn new(http: reqwest::Client, model: ModelId, api_key: String) -> Self {
        Self {
            http,
            model,
            api_key,
        }
    }
}

fn chat_messages<'a>(prompt: &'a str, options: &'a GenerateOptions) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = options.system_prompt.as_deref() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: prompt,
    });
    messages
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn model_id(&self) -> ModelId {
        self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, LlmError> {
        tracing::debug!(model = %self.model, max_tokens = options.max_tokens, "Generating with OpenAI");

        let body = ChatRequest {
            model: self.model.as_str(),
            messages: chat_messages(prompt, options),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER,
                message: "no message content".to_string(),
            })?;

        Ok(Generation {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_comes_first() {
        let options = GenerateOptions::new(0.3, 1000).with_system_prompt("be terse");
        let messages = chat_messages("classify", &options);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "classify");

        let plain = GenerateOptions::default();
        assert_eq!(chat_messages("x", &plain).len(), 1);
    }

    #[test]
    fn test_response_without_content_is_rejected_shape() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0]
            .message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .is_none());
    }
}
