//! Phase 2: INTENT

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::models::{IntentAnalysis, StageResult};
use crate::prompts;
use crate::services::escalation::{run_structured, PromptSpec, StructuredRequest};

const REQUIRED_FIELDS: &[&str] = &["intent", "userGoal", "buyerStage"];

/// Stand-in used when neither attempt produced a classification
pub fn intent_fallback(keyword: &str) -> IntentAnalysis {
    IntentAnalysis {
        intent: "informational".to_string(),
        user_goal: format!("Learn about {keyword}"),
        buyer_stage: "awareness".to_string(),
        confidence: 0,
        reasoning: "Intent could not be classified automatically; defaulted to informational"
            .to_string(),
    }
}

impl AnalysisOrchestrator {
    /// Phase 2: INTENT - Classify search intent from the result listing
    pub(super) async fn phase_intent(&self, run: &AnalysisRun<'_>) -> StageResult<IntentAnalysis> {
        let keyword = run.request.keyword();
        let request = StructuredRequest {
            stage: "intent",
            primary: PromptSpec::new(prompts::intent::primary(keyword, &run.search_results), 0.3, 1000),
            retry: PromptSpec::new(prompts::intent::retry(keyword, &run.search_results), 0.2, 600),
            required_fields: REQUIRED_FIELDS,
            limiter: None,
        };

        let result = run_structured::<IntentAnalysis>(run.model.as_ref(), &request)
            .await
            .or_fallback(|_| intent_fallback(keyword));

        if let Some(intent) = result.value() {
            tracing::info!(
                analysis_id = %run.id,
                intent = %intent.intent,
                confidence = intent.confidence,
                "Classified search intent"
            );
        }
        result
    }
}
