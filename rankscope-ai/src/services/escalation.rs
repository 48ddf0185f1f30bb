//! Retry/fallback escalation for structured model calls
//!
//! One primary prompt, one constrained retry at a lower temperature, then a
//! caller-supplied fallback. Each attempt is: generate, extract JSON, check
//! required fields for truthiness, deserialize. Failures never escape as
//! errors; they come back as an [`Escalation`] the stage turns into a
//! [`StageResult`].

use crate::llm::{GenerateOptions, LanguageModel, LlmError};
use crate::models::StageResult;
use crate::utils::json_extract::{extract_json, missing_fields, JsonExtractError};
use crate::utils::RateLimiter;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Prompt text plus the settings it is sent with
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub prompt: String,
    pub options: GenerateOptions,
}

impl PromptSpec {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerateOptions::new(temperature, max_tokens),
        }
    }
}

/// One structured call with its retry
pub struct StructuredRequest<'a> {
    /// Stage name for logs
    pub stage: &'static str,
    pub primary: PromptSpec,
    pub retry: PromptSpec,
    pub required_fields: &'a [&'a str],
    /// Spacing applied before every model call, when set
    pub limiter: Option<&'a RateLimiter>,
}

/// Why a single attempt produced nothing usable
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("unparsable output: {0}")]
    Unparsable(#[from] JsonExtractError),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("unexpected output shape: {0}")]
    Shape(String),
}

impl AttemptFailure {
    /// The model answered with valid JSON that did not fit the stage
    pub fn parsed(&self) -> bool {
        matches!(
            self,
            AttemptFailure::MissingFields(_) | AttemptFailure::Shape(_)
        )
    }
}

/// How far escalation had to go
#[derive(Debug)]
pub enum Escalation<T> {
    Primary(T),
    Retried {
        value: T,
        primary_failure: AttemptFailure,
    },
    Exhausted {
        primary_failure: AttemptFailure,
        retry_failure: AttemptFailure,
    },
}

fn retried_reason(primary_failure: &AttemptFailure) -> String {
    format!("primary attempt failed ({primary_failure}); retry succeeded")
}

impl<T> Escalation<T> {
    /// Resolve to a stage result, substituting `fallback` when both attempts failed
    ///
    /// The fallback receives the retry's failure so stages can pick between
    /// fallback variants.
    pub fn or_fallback(self, fallback: impl FnOnce(&AttemptFailure) -> T) -> StageResult<T> {
        match self {
            Escalation::Primary(value) => StageResult::ok(value),
            Escalation::Retried {
                value,
                primary_failure,
            } => StageResult::degraded(value, retried_reason(&primary_failure)),
            Escalation::Exhausted {
                primary_failure,
                retry_failure,
            } => {
                let value = fallback(&retry_failure);
                StageResult::degraded(
                    value,
                    format!(
                        "primary attempt failed ({primary_failure}); retry failed ({retry_failure}); using fallback"
                    ),
                )
            }
        }
    }

    /// Resolve to a stage result for work that has no fallback
    pub fn or_failed(self) -> StageResult<T> {
        match self {
            Escalation::Primary(value) => StageResult::ok(value),
            Escalation::Retried {
                value,
                primary_failure,
            } => StageResult::degraded(value, retried_reason(&primary_failure)),
            Escalation::Exhausted {
                primary_failure,
                retry_failure,
            } => StageResult::failed(format!(
                "primary attempt failed ({primary_failure}); retry failed ({retry_failure})"
            )),
        }
    }
}

async fn attempt<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    spec: &PromptSpec,
    required_fields: &[&str],
    limiter: Option<&RateLimiter>,
) -> Result<T, AttemptFailure> {
    if let Some(limiter) = limiter {
        limiter.wait().await;
    }

    let generation = model.generate(&spec.prompt, &spec.options).await?;
    let value = extract_json(&generation.text)?;

    let missing = missing_fields(&value, required_fields);
    if !missing.is_empty() {
        return Err(AttemptFailure::MissingFields(
            missing.into_iter().map(str::to_string).collect(),
        ));
    }

    serde_json::from_value(value).map_err(|e| AttemptFailure::Shape(e.to_string()))
}

/// Run the primary prompt and, if needed, the retry
pub async fn run_structured<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: &StructuredRequest<'_>,
) -> Escalation<T> {
    let primary_failure =
        match attempt(model, &request.primary, request.required_fields, request.limiter).await {
            Ok(value) => return Escalation::Primary(value),
            Err(failure) => failure,
        };

    tracing::info!(
        stage = request.stage,
        error = %primary_failure,
        "Primary attempt unusable, retrying with constrained prompt"
    );

    match attempt(model, &request.retry, request.required_fields, request.limiter).await {
        Ok(value) => Escalation::Retried {
            value,
            primary_failure,
        },
        Err(retry_failure) => {
            tracing::warn!(
                stage = request.stage,
                primary_error = %primary_failure,
                retry_error = %retry_failure,
                "Retry unusable"
            );
            Escalation::Exhausted {
                primary_failure,
                retry_failure,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentOriginAnalysis, IntentAnalysis, ModelId};
    use crate::services::analysis_orchestrator::intent_fallback;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers with queued texts in order, recording the options it saw
    struct QueuedModel {
        answers: Mutex<VecDeque<Result<String, LlmError>>>,
        seen: Mutex<Vec<GenerateOptions>>,
    }

    impl QueuedModel {
        fn new(answers: Vec<Result<&str, LlmError>>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for QueuedModel {
        fn model_id(&self) -> ModelId {
            ModelId::Gpt4
        }

        async fn generate(
            &self,
            _prompt: &str,
            options: &GenerateOptions,
        ) -> Result<crate::llm::Generation, LlmError> {
            self.seen.lock().unwrap().push(options.clone());
            let text = self
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .expect("model called more often than scripted")?;
            Ok(crate::llm::Generation {
                text,
                tokens_used: None,
            })
        }
    }

    fn intent_request() -> StructuredRequest<'static> {
        StructuredRequest {
            stage: "intent",
            primary: PromptSpec::new("primary", 0.3, 1000),
            retry: PromptSpec::new("retry", 0.2, 600),
            required_fields: &["intent", "userGoal", "buyerStage"],
            limiter: None,
        }
    }

    const GOOD: &str = r#"{"intent": "commercial", "userGoal": "Buy", "buyerStage": "decision", "confidence": 90}"#;

    #[tokio::test]
    async fn test_primary_success_is_ok() {
        let model = QueuedModel::new(vec![Ok(GOOD)]);

        let result = run_structured::<IntentAnalysis>(&model, &intent_request())
            .await
            .or_fallback(|_| intent_fallback("shoes"));

        assert!(result.is_ok());
        assert_eq!(result.value().unwrap().intent, "commercial");
        assert_eq!(model.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_field_retries_at_lower_temperature() {
        let model = QueuedModel::new(vec![Ok(r#"{"intent": "commercial", "userGoal": ""}"#), Ok(GOOD)]);

        let result = run_structured::<IntentAnalysis>(&model, &intent_request())
            .await
            .or_fallback(|_| intent_fallback("shoes"));

        assert!(result.is_degraded());
        assert!(result.reason().unwrap().contains("userGoal, buyerStage"));
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[1].temperature, 0.2);
        assert_eq!(seen[1].max_tokens, 600);
    }

    #[tokio::test]
    async fn test_both_unparsable_yields_fallback() {
        let model = QueuedModel::new(vec![Ok("no json here"), Ok("still nothing")]);

        let result = run_structured::<IntentAnalysis>(&model, &intent_request())
            .await
            .or_fallback(|_| intent_fallback("shoes"));

        assert!(!result.is_failed());
        assert_eq!(result.value(), Some(&intent_fallback("shoes")));
        assert!(result.reason().unwrap().contains("using fallback"));
    }

    #[tokio::test]
    async fn test_fallback_sees_retry_failure_kind() {
        // Retry parsed but lacked fields
        let model = QueuedModel::new(vec![Ok("garbage"), Ok(r#"{"intent": "x"}"#)]);
        let escalation = run_structured::<IntentAnalysis>(&model, &intent_request()).await;
        let mut parsed = None;
        escalation.or_fallback(|failure| {
            parsed = Some(failure.parsed());
            IntentAnalysis::default()
        });
        assert_eq!(parsed, Some(true));

        // Retry call itself errored
        let model = QueuedModel::new(vec![
            Ok("garbage"),
            Err(LlmError::Network {
                provider: "OpenAI",
                message: "reset".to_string(),
            }),
        ]);
        let escalation = run_structured::<IntentAnalysis>(&model, &intent_request()).await;
        let mut parsed = None;
        escalation.or_fallback(|failure| {
            parsed = Some(failure.parsed());
            IntentAnalysis::default()
        });
        assert_eq!(parsed, Some(false));
    }

    #[tokio::test]
    async fn test_exhausted_without_fallback_fails() {
        let model = QueuedModel::new(vec![Ok("[1, 2"), Ok("{")]);

        let result = run_structured::<IntentAnalysis>(&model, &intent_request())
            .await
            .or_failed();

        assert!(result.is_failed());
        assert!(result.reason().unwrap().contains("retry failed"));
    }

    #[tokio::test]
    async fn test_missing_verdict_retries() {
        let model = QueuedModel::new(vec![
            Ok(r#"{"confidenceScore": 80, "summary": "Reads generated"}"#),
            Ok(r#"{"isLikelyAIGenerated": true, "confidenceScore": 80, "summary": "Reads generated"}"#),
        ]);
        let request = StructuredRequest {
            stage: "content_origin",
            primary: PromptSpec::new("primary", 0.3, 1500),
            retry: PromptSpec::new("retry", 0.2, 800),
            required_fields: &["confidenceScore", "summary"],
            limiter: None,
        };

        let result = run_structured::<ContentOriginAnalysis>(&model, &request)
            .await
            .or_failed();

        assert!(result.is_degraded());
        assert!(result.value().unwrap().is_likely_ai_generated);
        assert_eq!(model.seen.lock().unwrap().len(), 2);
    }
}
