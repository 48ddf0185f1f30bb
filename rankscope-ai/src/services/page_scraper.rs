//! Page scraping with the daily page cache
//!
//! Fetch → extract → cache. A cached feature set is returned with a fresh
//! `fetched_at`; everything else about it is reused as stored.

use crate::cache::{keys::page_key, Cache};
use crate::models::PageFeatureSet;
use crate::services::content_extractor::extract;
use crate::services::page_fetcher::{FetchError, PageFetcher};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Cache settings for scraped pages
#[derive(Debug, Clone, Copy)]
pub struct ScrapeCachePolicy {
    pub enabled: bool,
    pub ttl_hours: u64,
}

#[derive(Clone)]
pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher>,
    cache: Cache,
    policy: ScrapeCachePolicy,
}

impl PageScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, cache: Cache, policy: ScrapeCachePolicy) -> Self {
        Self {
            fetcher,
            cache,
            policy,
        }
    }

    /// Scrape one URL into a feature set
    pub async fn scrape(&self, url: &str) -> Result<PageFeatureSet, ScrapeError> {
        let now = self.cache.clock().now();
        let key = page_key(url, now);

        if self.policy.enabled {
            if let Some(mut cached) = self.cache.get::<PageFeatureSet>(&key).await {
                tracing::debug!(url, "Page cache hit");
                cached.fetched_at = now;
                return Ok(cached);
            }
            tracing::debug!(url, "Page cache miss");
        }

        let html = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let page = extract(&html, url, now);
        tracing::info!(url, word_count = page.word_count, "Scraped page");

        if self.policy.enabled {
            self.cache.set(&key, &page, self.policy.ttl_hours).await;
        }

        Ok(page)
    }

    /// Scrape, substituting the placeholder when the page cannot be fetched
    ///
    /// The scrape error comes back alongside the placeholder so callers can
    /// record why the page is incomplete.
    pub async fn scrape_or_placeholder(&self, url: &str) -> (PageFeatureSet, Option<ScrapeError>) {
        match self.scrape(url).await {
            Ok(page) => (page, None),
            Err(e) => {
                tracing::warn!(url, error = %e, "Scrape failed, using placeholder");
                (PageFeatureSet::placeholder(url, self.cache.clock().now()), Some(e))
            }
        }
    }
}
