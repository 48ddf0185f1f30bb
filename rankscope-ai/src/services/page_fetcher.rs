//! Raw page fetching
//!
//! Direct fetches present a desktop browser identity and retry transient
//! failures with exponential backoff. When the ScrapingBee proxy is enabled
//! it is tried first and any proxy failure falls back to a direct fetch.

use crate::utils::backoff::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use std::time::Duration;
use thiserror::Error;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SCRAPINGBEE_URL: &str = "https://app.scrapingbee.com/api/v1/";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("ScrapingBee error: {0}")]
    Proxy(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// 4xx responses other than 429 are permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status(code) => !(400..500).contains(code) || *code == 429,
            FetchError::Network(_) => true,
            FetchError::Proxy(_) | FetchError::Client(_) => false,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Markup of the page at `url`
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageFetcher {
    http: reqwest::Client,
    /// Present only when proxy fetching is enabled and a key is configured
    scrapingbee_api_key: Option<String>,
    retry: RetryPolicy,
}

impl HttpPageFetcher {
    pub fn new(use_scrapingbee: bool, scrapingbee_api_key: Option<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let scrapingbee_api_key = if use_scrapingbee {
            let key = scrapingbee_api_key.filter(|k| !k.is_empty());
            if key.is_some() {
                tracing::info!("ScrapingBee proxy fetching enabled");
            } else {
                tracing::warn!("USE_SCRAPINGBEE is set but SCRAPINGBEE_API_KEY is missing; fetching directly");
            }
            key
        } else {
            None
        };

        Ok(Self {
            http,
            scrapingbee_api_key,
            retry: RetryPolicy::default(),
        })
    }

    async fn fetch_with_scrapingbee(&self, api_key: &str, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "Fetching through ScrapingBee");

        let response = self
            .http
            .get(SCRAPINGBEE_URL)
            .query(&[
                ("api_key", api_key),
                ("url", url),
                ("render_js", "false"),
                ("premium_proxy", "false"),
                ("country_code", "us"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Proxy(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Proxy(format!("HTTP {}", status.as_u16())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Proxy(e.to_string()))?;
        if html.is_empty() {
            return Err(FetchError::Proxy("empty response".to_string()));
        }

        tracing::debug!(url, bytes = html.len(), "ScrapingBee fetch succeeded");
        Ok(html)
    }

    async fn fetch_once(&self, url: &str, attempt: u32) -> Result<String, FetchError> {
        tracing::debug!(url, attempt, max_attempts = self.retry.max_attempts, "Direct fetch");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }

    async fn fetch_directly(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(
            "page fetch",
            self.retry,
            FetchError::is_retryable,
            |attempt| self.fetch_once(url, attempt),
        )
        .await
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(api_key) = self.scrapingbee_api_key.as_deref() {
            match self.fetch_with_scrapingbee(api_key, url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    tracing::warn!(url, error = %e, "ScrapingBee failed, falling back to direct fetch");
                }
            }
        }

        self.fetch_directly(url).await
    }
}
