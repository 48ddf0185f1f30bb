//! Phase 4: PATTERN_DETECTION

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::models::{ContentLength, PageAnalysis, PatternAnalysis, StageResult};
use crate::prompts;
use crate::services::escalation::{run_structured, PromptSpec, StructuredRequest};

const REQUIRED_FIELDS: &[&str] = &["commonPatterns", "contentLength"];

/// Word-count-only patterns computed without the model
pub fn patterns_fallback(analyses: &[PageAnalysis]) -> PatternAnalysis {
    let counts: Vec<u64> = analyses.iter().map(|a| a.page_data.word_count as u64).collect();
    let average = if counts.is_empty() {
        0
    } else {
        (counts.iter().sum::<u64>() as f64 / counts.len() as f64).round() as u64
    };
    let min = counts.iter().min().copied().unwrap_or(0);
    let max = counts.iter().max().copied().unwrap_or(0);

    PatternAnalysis {
        common_patterns: Vec::new(),
        content_length: ContentLength {
            average,
            range: format!("{min} - {max} words"),
            recommendation: format!("Aim for roughly {average} words to match top-ranking pages"),
        },
        common_elements: Vec::new(),
        content_structure: "Pattern detection unavailable; review competitor structure manually"
            .to_string(),
        must_have_elements: Vec::new(),
    }
}

impl AnalysisOrchestrator {
    /// Phase 4: PATTERN_DETECTION - Patterns shared across competitor pages
    pub(super) async fn phase_patterns(&self, run: &AnalysisRun<'_>) -> StageResult<PatternAnalysis> {
        let keyword = run.request.keyword();
        let analyses = &run.competitor_analyses;
        let request = StructuredRequest {
            stage: "pattern_detection",
            primary: PromptSpec::new(prompts::patterns::primary(keyword, analyses), 0.4, 2500),
            retry: PromptSpec::new(prompts::patterns::retry(keyword, analyses), 0.3, 1500),
            required_fields: REQUIRED_FIELDS,
            limiter: None,
        };

        let result = run_structured::<PatternAnalysis>(run.model.as_ref(), &request)
            .await
            .or_fallback(|_| patterns_fallback(analyses));

        if let Some(patterns) = result.value() {
            tracing::info!(
                analysis_id = %run.id,
                patterns = patterns.common_patterns.len(),
                average_words = patterns.content_length.average,
                "Detected common patterns"
            );
        }
        result
    }
}
