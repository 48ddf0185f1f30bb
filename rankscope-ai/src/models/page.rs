//! Search results and scraped page features

use crate::schema::SchemaValidationSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to a page that could not be fetched
pub const PLACEHOLDER_TITLE: &str = "Unable to scrape (403/404 or blocked)";

/// Content text given to a page that could not be fetched
pub const PLACEHOLDER_CONTENT: &str =
    "Page could not be scraped - site may have anti-bot protection.";

/// One organic search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub position: u32,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub domain: String,
}

/// Whether a feature set came from real markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    #[default]
    Scraped,
    Placeholder,
}

/// Normalized scrape result for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFeatureSet {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    #[serde(rename = "h1Tags")]
    pub h1_tags: Vec<String>,
    #[serde(rename = "h2Tags")]
    pub h2_tags: Vec<String>,
    #[serde(rename = "h3Tags")]
    pub h3_tags: Vec<String>,
    pub content_text: String,
    pub word_count: usize,
    pub has_schema: bool,
    pub schema_types: Vec<String>,
    pub image_count: usize,
    pub has_video: bool,
    #[serde(rename = "hasFAQ")]
    pub has_faq: bool,
    pub has_tables: bool,
    pub has_lists: bool,
    pub internal_links: usize,
    pub external_links: usize,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub scrape_status: ScrapeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_validation: Option<SchemaValidationSummary>,
}

impl PageFeatureSet {
    /// Placeholder for a page that could not be fetched or extracted
    pub fn placeholder(url: &str, fetched_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            meta_description: String::new(),
            h1_tags: Vec::new(),
            h2_tags: Vec::new(),
            h3_tags: Vec::new(),
            content_text: PLACEHOLDER_CONTENT.to_string(),
            word_count: 0,
            has_schema: false,
            schema_types: Vec::new(),
            image_count: 0,
            has_video: false,
            has_faq: false,
            has_tables: false,
            has_lists: false,
            internal_links: 0,
            external_links: 0,
            fetched_at,
            scrape_status: ScrapeStatus::Placeholder,
            schema_validation: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.scrape_status == ScrapeStatus::Placeholder
    }
}
