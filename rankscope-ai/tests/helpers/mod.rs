//! Test Helper Utilities
//!
//! Shared mock collaborators and fixtures for rankscope-ai integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::{article_page, competitor_urls, search_results, TARGET_URL};
pub use mocks::{MockFactory, MockFetcher, MockSearch, ScriptedModel};

use rankscope_ai::cache::{Cache, FileStore};
use rankscope_ai::services::{AnalysisOrchestrator, PageScraper, PipelineSettings, ScrapeCachePolicy};
use rankscope_common::events::EventBus;
use rankscope_common::time::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Pipeline settings without pacing delays
pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        scrape_delay: Duration::ZERO,
        model_call_spacing: Duration::ZERO,
        ..Default::default()
    }
}

/// Orchestrator over mock collaborators, page cache disabled
///
/// The returned `TempDir` backs the cache and must outlive the orchestrator.
pub fn build_orchestrator(
    search: MockSearch,
    fetcher: MockFetcher,
    factory: MockFactory,
    event_bus: EventBus,
    settings: PipelineSettings,
) -> (AnalysisOrchestrator, TempDir) {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(Arc::new(FileStore::new(dir.path())), Arc::new(SystemClock));
    let scraper = PageScraper::new(
        Arc::new(fetcher),
        cache,
        ScrapeCachePolicy {
            enabled: false,
            ttl_hours: 24,
        },
    );

    let orchestrator =
        AnalysisOrchestrator::new(Arc::new(search), scraper, Arc::new(factory), event_bus, settings);
    (orchestrator, dir)
}

/// Five competitor pages plus the target, all fetchable
pub fn healthy_fetcher() -> MockFetcher {
    let mut fetcher = MockFetcher::default();
    for (i, url) in competitor_urls().iter().enumerate() {
        fetcher = fetcher.with_page(url, &article_page(&format!("Competitor {}", i + 1), 300 + 100 * i));
    }
    fetcher.with_page(TARGET_URL, &article_page("Our page", 150))
}
