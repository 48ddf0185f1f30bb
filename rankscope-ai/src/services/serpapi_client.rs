//! SerpAPI search provider
//!
//! Looks up Google organic results for a keyword and keeps the top five.
//! Results are cached under the daily search key when caching is enabled.

use crate::cache::{keys::search_key, Cache};
use crate::models::SearchResult;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// Organic results kept per search
pub const TOP_RESULTS: usize = 5;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SERPAPI_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("SerpAPI search failed: {0}")]
    Network(String),

    #[error("SerpAPI search failed: SerpAPI Error: {0}")]
    Api(String),

    #[error("SerpAPI search failed: SerpAPI returned an error status. Check your API key and quota.")]
    ErrorStatus,

    #[error("No organic results found for keyword: \"{0}\". This might be a restricted or unavailable search.")]
    NoResults(String),

    #[error("SerpAPI search failed: {0}")]
    Parse(String),
}

/// Locale and size of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub location: String,
    /// Country code
    pub gl: String,
    /// Language code
    pub hl: String,
    pub num: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            location: "United States".to_string(),
            gl: "us".to_string(),
            hl: "en".to_string(),
            num: 10,
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    error: Option<String>,
    search_metadata: Option<SearchMetadata>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct SearchMetadata {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    position: Option<u32>,
    #[serde(default)]
    title: String,
    link: Option<String>,
    snippet: Option<String>,
}

/// URL host without a leading `www.`; the input itself when unparsable
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_else(|| url.to_string())
}

fn top_results(response: SerpApiResponse) -> Vec<SearchResult> {
    response
        .organic_results
        .into_iter()
        .filter_map(|r| r.link.map(|link| (r.position, r.title, link, r.snippet)))
        .take(TOP_RESULTS)
        .enumerate()
        .map(|(i, (position, title, link, snippet))| SearchResult {
            position: position.unwrap_or(i as u32 + 1),
            title,
            domain: extract_domain(&link),
            url: link,
            snippet: snippet.unwrap_or_default(),
        })
        .collect()
}

/// Cache settings for search lookups
#[derive(Debug, Clone, Copy)]
pub struct SearchCachePolicy {
    pub enabled: bool,
    pub ttl_hours: u64,
}

pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    cache: Cache,
    cache_policy: SearchCachePolicy,
    /// One request per second
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl SerpApiClient {
    pub fn new(
        api_key: Option<String>,
        cache: Cache,
        cache_policy: SearchCachePolicy,
    ) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            cache,
            cache_policy,
            rate_limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
        })
    }

    async fn fetch(
        &self,
        api_key: &str,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.rate_limiter.until_ready().await;

        let num = options.num.to_string();
        let params = [
            ("api_key", api_key),
            ("engine", "google"),
            ("q", keyword),
            ("location", options.location.as_str()),
            ("gl", options.gl.as_str()),
            ("hl", options.hl.as_str()),
            ("num", num.as_str()),
        ];

        tracing::info!(
            keyword,
            location = %options.location,
            gl = %options.gl,
            "Fetching search results"
        );

        let response = self
            .http
            .get(SERPAPI_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("HTTP {}: {}", status.as_u16(), e)))?;

        if let Some(error) = body.error.clone() {
            return Err(SearchError::Api(error));
        }
        if body
            .search_metadata
            .as_ref()
            .and_then(|m| m.status.as_deref())
            == Some("error")
        {
            return Err(SearchError::ErrorStatus);
        }

        let results = top_results(body);
        if results.is_empty() {
            return Err(SearchError::NoResults(keyword.to_string()));
        }
        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SearchError::MissingApiKey)?;

        let key = search_key(
            keyword,
            &options.location,
            &options.gl,
            &options.hl,
            self.cache.clock().now(),
        );

        if self.cache_policy.enabled {
            if let Some(cached) = self.cache.get::<Vec<SearchResult>>(&key).await {
                tracing::info!(keyword, "Search cache hit");
                return Ok(cached);
            }
        }

        let results = self.fetch(api_key, keyword, options).await?;

        if self.cache_policy.enabled {
            self.cache
                .set(&key, &results, self.cache_policy.ttl_hours)
                .await;
            tracing::debug!(keyword, ttl_hours = self.cache_policy.ttl_hours, "Cached search results");
        }

        Ok(results)
    }
}
