//! Error types for rankscope-ai
//!
//! Pipeline failures carry a stable `type` string that crosses the HTTP
//! boundary together with the message; provider payloads never do.

use crate::llm::LlmError;
use crate::models::{PartialReport, ValidationError};
use crate::services::serpapi_client::SearchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Condition under which no report can be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalPrecondition {
    #[error("No search results found for keyword: \"{0}\"")]
    NoSearchResults(String),

    #[error("Only scraped {scraped} competitor pages. Need at least 2 for analysis. Some sites may be blocking the scraper.")]
    TooFewCompetitorPages { scraped: usize },

    #[error("Only {analyzed} competitor pages could be analyzed. Need at least 2 for analysis.")]
    TooFewCompetitorAnalyses { analyzed: usize },
}

/// Why an analysis run stopped without a report
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Search(SearchError),

    #[error("Analysis pipeline failed: {0}")]
    Fatal(FatalPrecondition),

    #[error("Analysis timed out during {stage}")]
    Timeout {
        stage: &'static str,
        partial: Box<PartialReport>,
    },

    #[error("{0}")]
    Config(LlmError),
}

impl PipelineError {
    /// Stable error category reported to clients
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Search(_) => "search",
            PipelineError::Fatal(_) => "analysis",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Config(_) => "llm",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Search(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Fatal(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Gathered state, for timeouts
    pub fn partial(&self) -> Option<&PartialReport> {
        match self {
            PipelineError::Timeout { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl From<SearchError> for PipelineError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::NoResults(keyword) => {
                PipelineError::Fatal(FatalPrecondition::NoSearchResults(keyword))
            }
            other => PipelineError::Search(other),
        }
    }
}

impl From<FatalPrecondition> for PipelineError {
    fn from(precondition: FatalPrecondition) -> Self {
        PipelineError::Fatal(precondition)
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected request (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Analysis stopped without a report
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Anything unexpected (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Pipeline(e) => e.error_type(),
            ApiError::Internal(_) => "unknown",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{success: false, error, type}` body shared by JSON and SSE responses
    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "type": self.error_type(),
        });
        if let Some(partial) = match self {
            ApiError::Pipeline(e) => e.partial(),
            _ => None,
        } {
            body["partial"] = serde_json::to_value(partial).unwrap_or_default();
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_results_becomes_fatal() {
        let error = PipelineError::from(SearchError::NoResults("kw".to_string()));
        assert_eq!(error.error_type(), "analysis");

        let error = PipelineError::from(SearchError::MissingApiKey);
        assert_eq!(error.error_type(), "search");
    }

    #[test]
    fn test_api_body_shape() {
        let error = ApiError::from(ValidationError::KeywordRequired);
        let body = error.body();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Keyword is required");
        assert_eq!(body["type"], "validation");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_body_carries_partial() {
        let error = ApiError::from(PipelineError::Timeout {
            stage: "intent",
            partial: Box::new(PartialReport {
                competitor_pages_scraped: 3,
                ..Default::default()
            }),
        });
        let body = error.body();
        assert_eq!(body["type"], "timeout");
        assert_eq!(body["partial"]["competitorPagesScraped"], 3);
    }

    #[test]
    fn test_missing_key_is_llm_type() {
        let error = PipelineError::Config(LlmError::MissingApiKey("ANTHROPIC_API_KEY"));
        assert_eq!(error.error_type(), "llm");
    }
}
