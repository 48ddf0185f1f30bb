//! Phase 3: COMPETITOR_ANALYSIS
//!
//! Pages go through an ordered queue: up to `competitor_concurrency` model
//! calls in flight, each spaced by the model-call limiter, results in the
//! original page order. A page whose analysis fails is dropped.

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::models::{PageAnalysis, PageAssessment, PageFeatureSet, StageResult};
use crate::prompts;
use crate::services::escalation::{run_structured, PromptSpec, StructuredRequest};
use crate::utils::RateLimiter;
use futures::stream::{self, StreamExt};

const REQUIRED_FIELDS: &[&str] = &["strengths", "contentType"];

/// Analysis plus degradation reason, or `(url, reason)` for a dropped page
pub(super) type CompetitorOutcome = Result<(PageAnalysis, Option<String>), (String, String)>;

impl AnalysisOrchestrator {
    /// Phase 3: COMPETITOR_ANALYSIS - One model assessment per scraped page
    pub(super) async fn phase_competitors(&self, run: &AnalysisRun<'_>) -> Vec<CompetitorOutcome> {
        let limiter = RateLimiter::new(self.settings.model_call_spacing);
        let concurrency = self.settings.competitor_concurrency.max(1);

        tracing::info!(
            analysis_id = %run.id,
            pages = run.competitor_pages.len(),
            concurrency,
            "Analyzing competitor pages"
        );

        // Collected eagerly so the run future stays `Send` under `tokio::spawn`
        let pending: Vec<_> = run
            .competitor_pages
            .iter()
            .map(|(position, page)| self.analyze_page(run, &limiter, *position, page))
            .collect();
        let outcomes: Vec<CompetitorOutcome> = stream::iter(pending)
            .buffered(concurrency)
            .collect()
            .await;

        let analyzed = outcomes.iter().filter(|o| o.is_ok()).count();
        tracing::info!(
            analysis_id = %run.id,
            analyzed,
            total = outcomes.len(),
            "Competitor analysis finished"
        );
        outcomes
    }

    async fn analyze_page(
        &self,
        run: &AnalysisRun<'_>,
        limiter: &RateLimiter,
        position: u32,
        page: &PageFeatureSet,
    ) -> CompetitorOutcome {
        let keyword = run.request.keyword();
        let request = StructuredRequest {
            stage: "competitor_analysis",
            primary: PromptSpec::new(prompts::page::primary(keyword, page, position), 0.5, 2000),
            retry: PromptSpec::new(prompts::page::retry(keyword, page, position), 0.3, 1000),
            required_fields: REQUIRED_FIELDS,
            limiter: Some(limiter),
        };

        tracing::debug!(analysis_id = %run.id, url = %page.url, position, "Analyzing page");

        let result = run_structured::<PageAssessment>(run.model.as_ref(), &request)
            .await
            .or_failed()
            .map(|assessment| PageAnalysis {
                position,
                url: page.url.clone(),
                title: page.title.clone(),
                assessment,
                page_data: page.clone(),
            });

        match result {
            StageResult::Ok { value } => Ok((value, None)),
            StageResult::Degraded { value, reason } => Ok((value, Some(reason))),
            StageResult::Failed { reason } => Err((page.url.clone(), reason)),
        }
    }
}
