//! Phase 5: CONTENT_ORIGIN
//!
//! Skipped for a placeholder target page; there is no text to judge.

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::models::{ContentOriginAnalysis, StageResult};
use crate::prompts;
use crate::services::escalation::{run_structured, PromptSpec, StructuredRequest};

/// `isLikelyAIGenerated` is not listed: `false` is a verdict, not an absence
const REQUIRED_FIELDS: &[&str] = &["confidenceScore", "summary"];

/// "Not assessed" result
pub fn content_origin_fallback() -> ContentOriginAnalysis {
    ContentOriginAnalysis {
        is_likely_ai_generated: false,
        confidence_score: 0,
        summary: "Content origin could not be assessed".to_string(),
        indicators: Vec::new(),
        human_like_qualities: Vec::new(),
        ai_like_qualities: Vec::new(),
        recommendation: "Review the page content manually".to_string(),
    }
}

impl AnalysisOrchestrator {
    /// Phase 5: CONTENT_ORIGIN - Does the target page read as generated text
    pub(super) async fn phase_content_origin(
        &self,
        run: &AnalysisRun<'_>,
    ) -> StageResult<ContentOriginAnalysis> {
        let target = run.target_page();
        if target.is_placeholder() {
            return StageResult::degraded(content_origin_fallback(), "target page was not scraped");
        }

        let request = StructuredRequest {
            stage: "content_origin",
            primary: PromptSpec::new(
                prompts::content_origin::primary(run.request.keyword(), &target),
                0.3,
                1500,
            ),
            retry: PromptSpec::new(prompts::content_origin::retry(&target), 0.2, 800),
            required_fields: REQUIRED_FIELDS,
            limiter: None,
        };

        let result = run_structured::<ContentOriginAnalysis>(run.model.as_ref(), &request)
            .await
            .or_fallback(|_| content_origin_fallback());

        if let Some(origin) = result.value() {
            tracing::info!(
                analysis_id = %run.id,
                likely_generated = origin.is_likely_ai_generated,
                confidence = origin.confidence_score,
                "Assessed content origin"
            );
        }
        result
    }
}
