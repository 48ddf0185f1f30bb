//! Service modules for the analysis pipeline
//!
//! External collaborators sit behind traits (`SearchProvider`,
//! `PageFetcher`) so the orchestrator can be driven by mocks in tests.

pub mod analysis_orchestrator;
pub mod content_extractor;
pub mod escalation;
pub mod page_fetcher;
pub mod page_scraper;
pub mod serpapi_client;

pub use analysis_orchestrator::{AnalysisOrchestrator, PipelineSettings};
pub use page_fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use page_scraper::{PageScraper, ScrapeCachePolicy, ScrapeError};
pub use serpapi_client::{SearchCachePolicy, SearchError, SearchOptions, SearchProvider, SerpApiClient};
