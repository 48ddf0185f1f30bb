//! Analysis request validation
//!
//! A request is validated once at the HTTP boundary and is immutable
//! afterwards. Nothing reaches the pipeline until all three fields pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Longest accepted keyword, in characters
pub const MAX_KEYWORD_CHARS: usize = 200;

/// Request rejected before any pipeline work started
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Keyword is required")]
    KeywordRequired,

    #[error("Keyword is too long (max 200 characters)")]
    KeywordTooLong,

    #[error("URL is required")]
    UrlRequired,

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("URL must use http or https protocol")]
    UnsupportedScheme,

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Model provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
}

/// Supported generative model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "claude-opus-4-5")]
    ClaudeOpus45,
    #[serde(rename = "claude-sonnet-4-5")]
    ClaudeSonnet45,
    #[serde(rename = "claude-haiku-4-5")]
    ClaudeHaiku45,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelId {
    pub const ALL: [ModelId; 6] = [
        ModelId::ClaudeOpus45,
        ModelId::ClaudeSonnet45,
        ModelId::ClaudeHaiku45,
        ModelId::Gpt4,
        ModelId::Gpt4Turbo,
        ModelId::Gpt35Turbo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::ClaudeOpus45 => "claude-opus-4-5",
            ModelId::ClaudeSonnet45 => "claude-sonnet-4-5",
            ModelId::ClaudeHaiku45 => "claude-haiku-4-5",
            ModelId::Gpt4 => "gpt-4",
            ModelId::Gpt4Turbo => "gpt-4-turbo",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    /// Provider selected by the identifier prefix (`claude-` / `gpt-`)
    pub fn provider(&self) -> Provider {
        if self.as_str().starts_with("claude-") {
            Provider::Anthropic
        } else {
            Provider::OpenAi
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidModel(s.to_string()))
    }
}

/// Validated analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    keyword: String,
    target_url: String,
    model: ModelId,
}

impl AnalysisRequest {
    /// Validate a raw JSON body `{keyword, targetUrl, model}`
    ///
    /// Checks run keyword → URL → model; the first failure is returned.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::InvalidBody)?;
        let field = |name: &str| object.get(name).and_then(Value::as_str).unwrap_or("");

        Self::new(field("keyword"), field("targetUrl"), field("model"))
    }

    pub fn new(keyword: &str, target_url: &str, model: &str) -> Result<Self, ValidationError> {
        let keyword = validate_keyword(keyword)?;
        let target_url = validate_url(target_url)?;
        let model = model.parse::<ModelId>()?;

        Ok(Self {
            keyword,
            target_url,
            model,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn model(&self) -> ModelId {
        self.model
    }
}

fn validate_keyword(keyword: &str) -> Result<String, ValidationError> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::KeywordRequired);
    }
    if trimmed.chars().count() > MAX_KEYWORD_CHARS {
        return Err(ValidationError::KeywordTooLong);
    }
    Ok(trimmed.to_string())
}

fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::UrlRequired);
    }
    let parsed = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        _ => Err(ValidationError::UnsupportedScheme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request_is_trimmed() {
        let request = AnalysisRequest::from_json(&json!({
            "keyword": "  best running shoes ",
            "targetUrl": " https://example.com/shoes ",
            "model": "claude-sonnet-4-5"
        }))
        .unwrap();

        assert_eq!(request.keyword(), "best running shoes");
        assert_eq!(request.target_url(), "https://example.com/shoes");
        assert_eq!(request.model(), ModelId::ClaudeSonnet45);
        assert_eq!(request.model().provider(), Provider::Anthropic);
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(
            AnalysisRequest::new("   ", "https://a.com", "gpt-4"),
            Err(ValidationError::KeywordRequired)
        );
        let long = "k".repeat(MAX_KEYWORD_CHARS + 1);
        assert_eq!(
            AnalysisRequest::new(&long, "https://a.com", "gpt-4"),
            Err(ValidationError::KeywordTooLong)
        );
        let exact = "k".repeat(MAX_KEYWORD_CHARS);
        assert!(AnalysisRequest::new(&exact, "https://a.com", "gpt-4").is_ok());
    }

    #[test]
    fn test_url_rules() {
        assert_eq!(
            AnalysisRequest::new("kw", "", "gpt-4"),
            Err(ValidationError::UrlRequired)
        );
        assert_eq!(
            AnalysisRequest::new("kw", "not a url", "gpt-4"),
            Err(ValidationError::InvalidUrl)
        );
        assert_eq!(
            AnalysisRequest::new("kw", "ftp://example.com/file", "gpt-4"),
            Err(ValidationError::UnsupportedScheme)
        );
    }

    #[test]
    fn test_model_rules() {
        assert_eq!(
            AnalysisRequest::new("kw", "https://a.com", "gpt-5"),
            Err(ValidationError::InvalidModel("gpt-5".to_string()))
        );
        assert_eq!(ModelId::Gpt35Turbo.provider(), Provider::OpenAi);
        for model in ModelId::ALL {
            assert_eq!(model.as_str().parse::<ModelId>(), Ok(model));
        }
    }

    #[test]
    fn test_non_object_and_non_string_fields() {
        assert_eq!(
            AnalysisRequest::from_json(&json!([1, 2])),
            Err(ValidationError::InvalidBody)
        );
        assert_eq!(
            AnalysisRequest::from_json(&json!({"keyword": 5, "targetUrl": "https://a.com", "model": "gpt-4"})),
            Err(ValidationError::KeywordRequired)
        );
    }
}
