//! Analysis pipeline orchestrator
//!
//! Runs the six stages strictly in order:
//! SEARCH_AND_SCRAPE → INTENT → COMPETITOR_ANALYSIS → PATTERN_DETECTION →
//! CONTENT_ORIGIN → RECOMMENDATIONS → COMPLETED
//!
//! Each stage lives in its own `phase_*` module. Phases read the run state
//! and hand back their output; only this module mutates the run, so the
//! deadline race can always snapshot what was gathered so far.
//!
//! Generative stages never fail the run. They resolve through the escalation
//! policy and anything below `Ok` is recorded as a diagnostic. Only the
//! preconditions in [`FatalPrecondition`], search errors, missing provider
//! configuration and the deadline stop a run.

use crate::error::{FatalPrecondition, PipelineError};
use crate::llm::{LanguageModel, ModelFactory};
use crate::models::{
    AnalysisReport, AnalysisRequest, AnalysisStage, ContentOriginAnalysis, IntentAnalysis,
    PageAnalysis, PageFeatureSet, PartialReport, PatternAnalysis, SearchResult, StageDiagnostic,
    StageResult,
};
use crate::report::markdown::render_report;
use crate::schema::{check_schema_health, compare_schemas};
use crate::services::page_scraper::PageScraper;
use crate::services::serpapi_client::{SearchOptions, SearchProvider};
use chrono::Utc;
use rankscope_common::events::{AnalysisEvent, EventBus};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

mod phase_competitors;
mod phase_content_origin;
mod phase_intent;
mod phase_patterns;
mod phase_recommendations;
mod phase_search;

pub use phase_content_origin::content_origin_fallback;
pub use phase_intent::intent_fallback;
pub use phase_patterns::patterns_fallback;
pub use phase_recommendations::{manual_review_fallback, match_patterns_fallback};

/// Fewest competitor pages a report can be built from
pub const MIN_COMPETITOR_PAGES: usize = 2;

/// Pacing, concurrency and deadline for one run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Gap between consecutive competitor fetches
    pub scrape_delay: Duration,
    /// Minimum spacing between competitor model calls
    pub model_call_spacing: Duration,
    pub competitor_concurrency: usize,
    /// Default wall-clock budget when the caller gives none
    pub deadline: Duration,
    pub search: SearchOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            scrape_delay: Duration::from_millis(1000),
            model_call_spacing: Duration::from_millis(500),
            competitor_concurrency: 1,
            deadline: Duration::from_secs(300),
            search: SearchOptions::default(),
        }
    }
}

/// Mutable state of one run
struct AnalysisRun<'a> {
    id: Uuid,
    request: &'a AnalysisRequest,
    model: Arc<dyn LanguageModel>,
    deadline: Instant,
    started: std::time::Instant,
    search_results: Vec<SearchResult>,
    /// `(search position, page)` for every competitor that scraped
    competitor_pages: Vec<(u32, PageFeatureSet)>,
    target_page: Option<PageFeatureSet>,
    intent: Option<IntentAnalysis>,
    competitor_analyses: Vec<PageAnalysis>,
    patterns: Option<PatternAnalysis>,
    content_origin: Option<ContentOriginAnalysis>,
    diagnostics: Vec<StageDiagnostic>,
}

impl<'a> AnalysisRun<'a> {
    fn record(&mut self, stage: AnalysisStage, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(
            analysis_id = %self.id,
            stage = stage.name(),
            reason = %reason,
            "Stage degraded"
        );
        self.diagnostics.push(StageDiagnostic {
            stage: stage.name().to_string(),
            reason,
        });
    }

    /// Take a stage's value, recording any degradation
    fn settle<T: Default>(&mut self, stage: AnalysisStage, result: StageResult<T>) -> T {
        let (value, reason) = result.into_parts();
        if let Some(reason) = reason {
            self.record(stage, reason);
        }
        value.unwrap_or_default()
    }

    fn partial(&self) -> PartialReport {
        PartialReport {
            search_results: self.search_results.clone(),
            competitor_pages_scraped: self.competitor_pages.len(),
            target_page_data: self.target_page.clone(),
            intent_analysis: self.intent.clone(),
            competitor_analyses: self.competitor_analyses.clone(),
            pattern_analysis: self.patterns.clone(),
            content_origin_analysis: self.content_origin.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    fn timed_out(&self, stage: AnalysisStage) -> PipelineError {
        tracing::warn!(
            analysis_id = %self.id,
            stage = stage.name(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Analysis deadline expired"
        );
        PipelineError::Timeout {
            stage: stage.name(),
            partial: Box::new(self.partial()),
        }
    }

    fn target_page(&self) -> PageFeatureSet {
        self.target_page
            .clone()
            .unwrap_or_else(|| PageFeatureSet::placeholder(self.request.target_url(), Utc::now()))
    }
}

/// Analysis orchestrator service
pub struct AnalysisOrchestrator {
    search: Arc<dyn SearchProvider>,
    scraper: PageScraper,
    models: Arc<dyn ModelFactory>,
    event_bus: EventBus,
    settings: PipelineSettings,
}

impl AnalysisOrchestrator {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        scraper: PageScraper,
        models: Arc<dyn ModelFactory>,
        event_bus: EventBus,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            scraper,
            models,
            event_bus,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the pipeline within the configured default deadline
    pub async fn run(
        &self,
        analysis_id: Uuid,
        request: &AnalysisRequest,
    ) -> Result<AnalysisReport, PipelineError> {
        let deadline = Instant::now() + self.settings.deadline;
        self.run_until(analysis_id, request, deadline).await
    }

    /// Run the pipeline, giving up at `deadline`
    ///
    /// Emits `AnalysisStarted`, one `AnalysisProgress` per stage, and exactly
    /// one of `AnalysisCompleted` / `AnalysisFailed`.
    pub async fn run_until(
        &self,
        analysis_id: Uuid,
        request: &AnalysisRequest,
        deadline: Instant,
    ) -> Result<AnalysisReport, PipelineError> {
        tracing::info!(
            analysis_id = %analysis_id,
            keyword = request.keyword(),
            target_url = request.target_url(),
            model = %request.model(),
            "Starting analysis"
        );

        self.event_bus.emit_lossy(AnalysisEvent::AnalysisStarted {
            analysis_id,
            keyword: request.keyword().to_string(),
            target_url: request.target_url().to_string(),
            model: request.model().to_string(),
            timestamp: Utc::now(),
        });

        let outcome = self.execute(analysis_id, request, deadline).await;

        match &outcome {
            Ok(report) => {
                tracing::info!(
                    analysis_id = %analysis_id,
                    competitors = report.competitor_analyses.len(),
                    diagnostics = report.diagnostics.len(),
                    elapsed_ms = report.duration_ms,
                    "Analysis completed"
                );
                self.event_bus.emit_lossy(AnalysisEvent::AnalysisCompleted {
                    analysis_id,
                    keyword: report.keyword.clone(),
                    competitor_count: report.competitor_analyses.len(),
                    degraded_stages: report.diagnostics.len(),
                    duration_ms: report.duration_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                tracing::error!(
                    analysis_id = %analysis_id,
                    error = %e,
                    error_type = e.error_type(),
                    "Analysis failed"
                );
                self.event_bus.emit_lossy(AnalysisEvent::AnalysisFailed {
                    analysis_id,
                    error: e.to_string(),
                    error_type: e.error_type().to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        outcome
    }

    async fn execute(
        &self,
        analysis_id: Uuid,
        request: &AnalysisRequest,
        deadline: Instant,
    ) -> Result<AnalysisReport, PipelineError> {
        let model = self
            .models
            .create(request.model())
            .map_err(PipelineError::Config)?;

        let mut run = AnalysisRun {
            id: analysis_id,
            request,
            model,
            deadline,
            started: std::time::Instant::now(),
            search_results: Vec::new(),
            competitor_pages: Vec::new(),
            target_page: None,
            intent: None,
            competitor_analyses: Vec::new(),
            patterns: None,
            content_origin: None,
            diagnostics: Vec::new(),
        };

        // Phase 1: SEARCH_AND_SCRAPE
        let stage = AnalysisStage::SearchAndScrape;
        self.enter_stage(&run, stage)?;
        let scraped = bounded(&run, stage, self.phase_search_and_scrape(&run)).await??;
        run.search_results = scraped.search_results;
        run.competitor_pages = scraped.competitor_pages;
        for (stage, reason) in scraped.diagnostics {
            run.record(stage, reason);
        }
        run.target_page = Some(scraped.target_page);
        if run.competitor_pages.len() < MIN_COMPETITOR_PAGES {
            return Err(FatalPrecondition::TooFewCompetitorPages {
                scraped: run.competitor_pages.len(),
            }
            .into());
        }

        // Phase 2: INTENT
        let stage = AnalysisStage::Intent;
        self.enter_stage(&run, stage)?;
        let intent = bounded(&run, stage, self.phase_intent(&run)).await?;
        run.intent = Some(run.settle(stage, intent));

        // Phase 3: COMPETITOR_ANALYSIS
        let stage = AnalysisStage::CompetitorAnalysis;
        self.enter_stage(&run, stage)?;
        let outcomes = bounded(&run, stage, self.phase_competitors(&run)).await?;
        for outcome in outcomes {
            match outcome {
                Ok((analysis, reason)) => {
                    if let Some(reason) = reason {
                        run.record(stage, format!("{}: {}", analysis.url, reason));
                    }
                    run.competitor_analyses.push(analysis);
                }
                Err((url, reason)) => {
                    run.record(stage, format!("{url}: dropped ({reason})"));
                }
            }
        }
        if run.competitor_analyses.len() < MIN_COMPETITOR_PAGES {
            return Err(FatalPrecondition::TooFewCompetitorAnalyses {
                analyzed: run.competitor_analyses.len(),
            }
            .into());
        }

        // Phase 4: PATTERN_DETECTION
        let stage = AnalysisStage::PatternDetection;
        self.enter_stage(&run, stage)?;
        let patterns = bounded(&run, stage, self.phase_patterns(&run)).await?;
        run.patterns = Some(run.settle(stage, patterns));

        // Phase 5: CONTENT_ORIGIN
        let stage = AnalysisStage::ContentOrigin;
        self.enter_stage(&run, stage)?;
        let origin = bounded(&run, stage, self.phase_content_origin(&run)).await?;
        run.content_origin = Some(run.settle(stage, origin));

        // Phase 6: RECOMMENDATIONS
        let stage = AnalysisStage::Recommendations;
        self.enter_stage(&run, stage)?;
        let recommendations = bounded(&run, stage, self.phase_recommendations(&run)).await?;
        let recommendations = run.settle(stage, recommendations);

        // COMPLETED
        self.emit_progress(&run, AnalysisStage::Completed);
        Ok(assemble_report(run, recommendations))
    }

    /// Check the deadline and announce the stage
    fn enter_stage(&self, run: &AnalysisRun<'_>, stage: AnalysisStage) -> Result<(), PipelineError> {
        if Instant::now() >= run.deadline {
            return Err(run.timed_out(stage));
        }

        tracing::info!(
            analysis_id = %run.id,
            stage = stage.name(),
            progress = stage.progress(),
            "{}",
            stage.label()
        );
        self.emit_progress(run, stage);
        Ok(())
    }

    fn emit_progress(&self, run: &AnalysisRun<'_>, stage: AnalysisStage) {
        self.event_bus.emit_lossy(AnalysisEvent::AnalysisProgress {
            analysis_id: run.id,
            stage: stage.label().to_string(),
            progress: stage.progress(),
            timestamp: Utc::now(),
        });
    }
}

/// Race a stage's work against the run deadline
async fn bounded<T>(
    run: &AnalysisRun<'_>,
    stage: AnalysisStage,
    work: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    tokio::time::timeout_at(run.deadline, work)
        .await
        .map_err(|_| run.timed_out(stage))
}

fn assemble_report(
    run: AnalysisRun<'_>,
    recommendations: crate::models::RecommendationAnalysis,
) -> AnalysisReport {
    let target_page = run.target_page();
    let target_page_incomplete = target_page.is_placeholder();
    let schema_health = check_schema_health(&target_page.schema_validation.clone().unwrap_or_default());
    let competitor_schemas: Vec<_> = run
        .competitor_analyses
        .iter()
        .filter_map(|a| {
            a.page_data
                .schema_validation
                .clone()
                .map(|summary| (a.url.clone(), summary))
        })
        .collect();

    let mut report = AnalysisReport {
        analysis_id: run.id,
        keyword: run.request.keyword().to_string(),
        target_url: run.request.target_url().to_string(),
        model: run.request.model().to_string(),
        analyzed_at: Utc::now(),
        duration_ms: run.started.elapsed().as_millis() as u64,
        intent_analysis: run.intent.unwrap_or_default(),
        search_results: run.search_results,
        competitor_analyses: run.competitor_analyses,
        pattern_analysis: run.patterns.unwrap_or_default(),
        target_page_data: target_page,
        target_page_incomplete,
        schema_health,
        competitor_schema_comparison: compare_schemas(&competitor_schemas),
        content_origin_analysis: run.content_origin.unwrap_or_default(),
        recommendations,
        diagnostics: run.diagnostics,
        markdown: String::new(),
    };
    report.markdown = render_report(&report);
    report
}
