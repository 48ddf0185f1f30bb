//! rankscope-ai library interface
//!
//! Exposes the pipeline, its collaborators and the HTTP router so that
//! integration tests can assemble the service with mock providers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod report;
pub mod schema;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use crate::api::health::EnvironmentFlags;
use crate::cache::Cache;
use crate::config::ServiceConfig;
use crate::llm::ProviderModelFactory;
use crate::services::analysis_orchestrator::AnalysisOrchestrator;
use crate::services::page_fetcher::HttpPageFetcher;
use crate::services::page_scraper::PageScraper;
use crate::services::serpapi_client::SerpApiClient;
use axum::Router;
use chrono::{DateTime, Utc};
use rankscope_common::events::EventBus;
use rankscope_common::Error;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Integrations reported by `/health`
    pub environment: Arc<EnvironmentFlags>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        event_bus: EventBus,
        environment: EnvironmentFlags,
    ) -> Self {
        Self {
            orchestrator,
            event_bus,
            environment: Arc::new(environment),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Wire the production collaborators from resolved configuration
pub fn build_state(config: &ServiceConfig, event_bus: EventBus) -> rankscope_common::Result<AppState> {
    let cache = Cache::from_config(&config.cache_backend, config.cache_dir.clone());
    let providers = &config.providers;

    let fetcher = HttpPageFetcher::new(
        providers.use_scrapingbee,
        providers.scrapingbee_api_key.clone(),
    )
    .map_err(|e| Error::Config(e.to_string()))?;
    let scraper = PageScraper::new(Arc::new(fetcher), cache.clone(), config.scrape_cache);

    let search = SerpApiClient::new(
        providers.serpapi_api_key.clone(),
        cache.clone(),
        config.search_cache,
    )
    .map_err(|e| Error::Config(e.to_string()))?;

    let models = ProviderModelFactory::new(
        providers.anthropic_api_key.clone(),
        providers.openai_api_key.clone(),
    )
    .map_err(|e| Error::Config(e.to_string()))?;

    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(search),
        scraper,
        Arc::new(models),
        event_bus.clone(),
        config.pipeline.clone(),
    );

    let environment = EnvironmentFlags::from_config(config, cache.kind());
    Ok(AppState::new(Arc::new(orchestrator), event_bus, environment))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
