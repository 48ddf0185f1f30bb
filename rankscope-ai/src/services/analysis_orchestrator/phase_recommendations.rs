//! Phase 6: RECOMMENDATIONS

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::models::{Priority, Recommendation, RecommendationAnalysis, StageResult};
use crate::prompts;
use crate::services::escalation::{run_structured, PromptSpec, StructuredRequest};

const REQUIRED_FIELDS: &[&str] = &["recommendations", "criticalGaps"];

/// Competitor word count cited when the patterns carry none
const DEFAULT_AVERAGE_WORDS: u64 = 2000;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fallback when the retry answered with JSON that lacked the required fields
pub fn match_patterns_fallback(average_words: u64) -> RecommendationAnalysis {
    let average = if average_words == 0 {
        DEFAULT_AVERAGE_WORDS
    } else {
        average_words
    };

    RecommendationAnalysis {
        critical_gaps: strings(&["Unable to generate detailed analysis due to JSON parsing issues"]),
        recommendations: vec![Recommendation {
            priority: Priority::High,
            category: "content".to_string(),
            title: "Match competitor content patterns".to_string(),
            description: format!(
                "Based on analysis, top pages average {average} words. Consider expanding content to match."
            ),
            reasoning: "Content length correlates with rankings for this keyword".to_string(),
            effort: "high".to_string(),
        }],
        quick_wins: strings(&["Review competitor strategies manually"]),
        content_strategy: "Analyze top-ranking pages for content structure and depth".to_string(),
        technical_seo: strings(&["Ensure proper schema markup", "Optimize page speed"]),
    }
}

/// Fallback when the retry call errored or produced no JSON
pub fn manual_review_fallback() -> RecommendationAnalysis {
    RecommendationAnalysis {
        critical_gaps: strings(&["Analysis encountered issues - manual review recommended"]),
        recommendations: vec![Recommendation {
            priority: Priority::High,
            category: "content".to_string(),
            title: "Analyze top-ranking competitors".to_string(),
            description: "Manually review the top 5 ranking pages to identify key content elements and structure.".to_string(),
            reasoning: "Automated analysis encountered technical issues".to_string(),
            effort: "medium".to_string(),
        }],
        quick_wins: strings(&[
            "Review competitor page structures",
            "Check schema markup implementation",
        ]),
        content_strategy: "Study successful competitor content patterns".to_string(),
        technical_seo: strings(&["Ensure technical SEO basics are covered"]),
    }
}

impl AnalysisOrchestrator {
    /// Phase 6: RECOMMENDATIONS - Gap analysis of the target against patterns
    pub(super) async fn phase_recommendations(
        &self,
        run: &AnalysisRun<'_>,
    ) -> StageResult<RecommendationAnalysis> {
        let keyword = run.request.keyword();
        let target = run.target_page();
        let patterns = run.patterns.clone().unwrap_or_default();
        let intent = run.intent.clone().unwrap_or_default();

        let request = StructuredRequest {
            stage: "recommendations",
            primary: PromptSpec::new(
                prompts::recommendations::primary(keyword, &target, &patterns, &intent),
                0.5,
                4096,
            ),
            retry: PromptSpec::new(
                prompts::recommendations::retry(keyword, &target, &patterns),
                0.3,
                2048,
            ),
            required_fields: REQUIRED_FIELDS,
            limiter: None,
        };

        let average_words = patterns.content_length.average;
        let result = run_structured::<RecommendationAnalysis>(run.model.as_ref(), &request)
            .await
            .or_fallback(|retry_failure| {
                if retry_failure.parsed() {
                    match_patterns_fallback(average_words)
                } else {
                    manual_review_fallback()
                }
            });

        if let Some(recommendations) = result.value() {
            tracing::info!(
                analysis_id = %run.id,
                recommendations = recommendations.recommendations.len(),
                "Generated recommendations"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_patterns_fallback_defaults_average() {
        let fallback = match_patterns_fallback(0);
        assert!(fallback.recommendations[0].description.contains("average 2000 words"));
        let fallback = match_patterns_fallback(1450);
        assert!(fallback.recommendations[0].description.contains("average 1450 words"));
    }

    #[test]
    fn test_manual_review_fallback_shape() {
        let fallback = manual_review_fallback();
        assert_eq!(fallback.recommendations.len(), 1);
        assert_eq!(fallback.recommendations[0].priority, Priority::High);
        assert_eq!(fallback.quick_wins.len(), 2);
    }
}
