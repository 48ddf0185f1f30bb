//! Phase 1: SEARCH_AND_SCRAPE
//!
//! Search lookup, sequential competitor scraping, target scraping

use super::{AnalysisOrchestrator, AnalysisRun};
use crate::error::PipelineError;
use crate::models::{AnalysisStage, PageFeatureSet, SearchResult};
use crate::utils::RateLimiter;

/// What the first phase gathered
pub(super) struct Scraped {
    pub search_results: Vec<SearchResult>,
    pub competitor_pages: Vec<(u32, PageFeatureSet)>,
    pub target_page: PageFeatureSet,
    pub diagnostics: Vec<(AnalysisStage, String)>,
}

impl AnalysisOrchestrator {
    /// Phase 1: SEARCH_AND_SCRAPE - Top results, competitor pages, target page
    pub(super) async fn phase_search_and_scrape(
        &self,
        run: &AnalysisRun<'_>,
    ) -> Result<Scraped, PipelineError> {
        let keyword = run.request.keyword();
        let search_results = self
            .search
            .search(keyword, &self.settings.search)
            .await?;

        tracing::info!(
            analysis_id = %run.id,
            results = search_results.len(),
            "Search returned results"
        );

        let mut diagnostics = Vec::new();
        let mut competitor_pages = Vec::with_capacity(search_results.len());
        let limiter = RateLimiter::new(self.settings.scrape_delay);

        for result in &search_results {
            limiter.wait().await;
            match self.scraper.scrape(&result.url).await {
                Ok(page) => competitor_pages.push((result.position, page)),
                Err(e) => {
                    tracing::warn!(
                        analysis_id = %run.id,
                        url = %result.url,
                        error = %e,
                        "Competitor scrape failed"
                    );
                    diagnostics.push((
                        AnalysisStage::SearchAndScrape,
                        format!("competitor #{} not scraped: {}", result.position, e),
                    ));
                }
            }
        }

        tracing::info!(
            analysis_id = %run.id,
            scraped = competitor_pages.len(),
            total = search_results.len(),
            "Competitor scraping finished"
        );

        let target_url = run.request.target_url();
        let (target_page, target_error) = self.scraper.scrape_or_placeholder(target_url).await;
        if let Some(e) = target_error {
            diagnostics.push((
                AnalysisStage::SearchAndScrape,
                format!("target page not scraped, using placeholder: {e}"),
            ));
        }

        Ok(Scraped {
            search_results,
            competitor_pages,
            target_page,
            diagnostics,
        })
    }
}
