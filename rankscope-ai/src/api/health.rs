//! Health check endpoint
//!
//! Reports uptime, build identification and which integrations are
//! configured. Secrets never appear; the search key is shown as a prefix.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::cache::CacheBackendKind;
use crate::config::ServiceConfig;
use crate::AppState;

/// Build identification embedded by `build.rs`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            git_hash: env!("GIT_HASH"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            build_profile: env!("BUILD_PROFILE"),
        }
    }
}

/// Configured integrations, as reported by `/health`
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnvironmentFlags {
    pub anthropic_configured: bool,
    pub openai_configured: bool,
    pub serpapi_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi_key_preview: Option<String>,
    pub cache_backend: Option<CacheBackendKind>,
    pub scrape_cache_enabled: bool,
    pub serp_cache_enabled: bool,
    pub use_scrapingbee: bool,
}

impl EnvironmentFlags {
    /// `cache_backend` is the backend actually in use, which may differ from
    /// the configured one after a redis fallback
    pub fn from_config(config: &ServiceConfig, cache_backend: CacheBackendKind) -> Self {
        let providers = &config.providers;
        Self {
            anthropic_configured: providers.anthropic_api_key.is_some(),
            openai_configured: providers.openai_api_key.is_some(),
            serpapi_configured: providers.serpapi_api_key.is_some(),
            serpapi_key_preview: providers.masked_serpapi_key(),
            cache_backend: Some(cache_backend),
            scrape_cache_enabled: config.scrape_cache.enabled,
            serp_cache_enabled: config.search_cache.enabled,
            use_scrapingbee: providers.use_scrapingbee,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("rankscope-ai")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    pub build: BuildInfo,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Most recent analysis failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub environment: EnvironmentFlags,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "rankscope-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: BuildInfo::current(),
        uptime_seconds,
        last_error,
        environment: state.environment.as_ref().clone(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
