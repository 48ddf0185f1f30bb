//! Service configuration for rankscope-ai
//!
//! Resolved once at startup from the bootstrap TOML plus environment
//! overrides (environment wins). Components receive the pieces they need;
//! nothing downstream reads the environment.

use crate::cache::CacheBackendConfig;
use crate::services::analysis_orchestrator::PipelineSettings;
use crate::services::page_scraper::ScrapeCachePolicy;
use crate::services::serpapi_client::{SearchCachePolicy, SearchOptions};
use rankscope_common::config::{env_flag, env_parse, env_string, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Provider credentials after resolution; empty values are treated as absent
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub serpapi_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub scrapingbee_api_key: Option<String>,
    pub use_scrapingbee: bool,
}

impl ProviderCredentials {
    /// First four characters of the search key followed by `...`
    pub fn masked_serpapi_key(&self) -> Option<String> {
        self.serpapi_api_key
            .as_deref()
            .map(|key| format!("{}...", key.chars().take(4).collect::<String>()))
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub cache_backend: CacheBackendConfig,
    /// Directory used by the file backend, and as fallback when redis is unusable
    pub cache_dir: PathBuf,
    pub scrape_cache: ScrapeCachePolicy,
    pub search_cache: SearchCachePolicy,
    pub pipeline: PipelineSettings,
    pub providers: ProviderCredentials,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pick the cache backend: redis when requested or when a URL is configured
fn resolve_cache_backend(backend: &str, redis_url: Option<String>, dir: &PathBuf) -> CacheBackendConfig {
    match (backend.trim().to_ascii_lowercase().as_str(), redis_url) {
        (_, Some(url)) => CacheBackendConfig::Redis { url },
        ("redis", None) => {
            warn!("Cache backend 'redis' requested without REDIS_URL; using file cache");
            CacheBackendConfig::File { dir: dir.clone() }
        }
        ("file", None) => CacheBackendConfig::File { dir: dir.clone() },
        (other, None) => {
            warn!(backend = other, "Unknown cache backend; using file cache");
            CacheBackendConfig::File { dir: dir.clone() }
        }
    }
}

impl ServiceConfig {
    /// Apply environment overrides on top of the bootstrap TOML
    pub fn resolve(toml: &TomlConfig) -> Self {
        let cache = &toml.cache;
        let pipeline = &toml.pipeline;
        let providers = &toml.providers;

        let cache_dir = env_string("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| cache.dir.clone());
        let redis_url = env_string("REDIS_URL").or_else(|| non_empty(&cache.redis_url));
        let cache_backend = resolve_cache_backend(&cache.backend, redis_url, &cache_dir);

        let scrape_cache = ScrapeCachePolicy {
            enabled: env_flag("ENABLE_SCRAPE_CACHE", cache.scrape_enabled),
            ttl_hours: env_parse("SCRAPE_CACHE_TTL_HOURS", cache.scrape_ttl_hours),
        };
        let search_cache = SearchCachePolicy {
            enabled: env_flag("ENABLE_SERP_CACHE", cache.serp_enabled),
            ttl_hours: env_parse("SERP_CACHE_TTL_HOURS", cache.serp_ttl_hours),
        };

        let pipeline = PipelineSettings {
            scrape_delay: Duration::from_millis(env_parse(
                "RATE_LIMIT_DELAY_MS",
                pipeline.rate_limit_delay_ms,
            )),
            model_call_spacing: Duration::from_millis(pipeline.model_call_spacing_ms),
            competitor_concurrency: env_parse(
                "COMPETITOR_CONCURRENCY",
                pipeline.competitor_concurrency,
            )
            .max(1),
            deadline: Duration::from_secs(env_parse(
                "ANALYSIS_DEADLINE_SECS",
                pipeline.deadline_secs,
            )),
            search: SearchOptions::default(),
        };

        let providers = ProviderCredentials {
            serpapi_api_key: env_string("SERPAPI_API_KEY")
                .or_else(|| non_empty(&providers.serpapi_api_key)),
            anthropic_api_key: env_string("ANTHROPIC_API_KEY")
                .or_else(|| non_empty(&providers.anthropic_api_key)),
            openai_api_key: env_string("OPENAI_API_KEY")
                .or_else(|| non_empty(&providers.openai_api_key)),
            scrapingbee_api_key: env_string("SCRAPINGBEE_API_KEY")
                .or_else(|| non_empty(&providers.scrapingbee_api_key)),
            use_scrapingbee: env_flag("USE_SCRAPINGBEE", providers.use_scrapingbee),
        };

        Self {
            bind_address: toml.bind_address.clone(),
            port: env_parse("PORT", toml.port),
            log_level: toml.logging.level.clone(),
            cache_backend,
            cache_dir,
            scrape_cache,
            search_cache,
            pipeline,
            providers,
        }
    }
}
