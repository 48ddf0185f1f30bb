//! Stage outputs and the aggregated report
//!
//! Model output is deserialized leniently: missing optional fields take
//! defaults, and numeric percentages may arrive as numbers or strings.
//! Required-field presence is checked by the escalation policy before
//! deserialization.

use crate::models::page::{PageFeatureSet, SearchResult};
use crate::schema::{SchemaComparison, SchemaHealthCheck};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        Value::Null => Some(0.0),
        _ => None,
    }
}

/// Percentage 0–100 from a number or numeric string
fn lenient_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    lenient_number(&value)
        .map(|n| n.clamp(0.0, 100.0).round() as u8)
        .ok_or_else(|| de::Error::custom(format!("expected a percentage, got {}", value)))
}

/// Non-negative count from a number or numeric string
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    lenient_number(&value)
        .map(|n| n.max(0.0).round() as u64)
        .ok_or_else(|| de::Error::custom(format!("expected a count, got {}", value)))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentAnalysis {
    /// informational | transactional | navigational | commercial
    pub intent: String,
    pub user_goal: String,
    /// awareness | consideration | decision
    pub buyer_stage: String,
    #[serde(deserialize_with = "lenient_percent")]
    pub confidence: u8,
    pub reasoning: String,
}

/// What a competitor page does well
///
/// Models return either a plain sentence or an object carrying CSS selectors
/// for the element; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Strength {
    Plain(String),
    Detailed {
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        #[serde(
            default,
            rename = "selectorFallback",
            skip_serializing_if = "Option::is_none"
        )]
        selector_fallback: Option<String>,
    },
}

impl Strength {
    pub fn description(&self) -> &str {
        match self {
            Strength::Plain(text) => text,
            Strength::Detailed { description, .. } => description,
        }
    }
}

/// Model assessment of one page, before it is attached to the page data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageAssessment {
    pub strengths: Vec<Strength>,
    pub content_type: String,
    pub key_elements: Vec<String>,
    pub target_audience: String,
    /// shallow | moderate | comprehensive
    pub content_depth: String,
    pub notes: String,
}

/// Analysis of one competitor page at its search position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub position: u32,
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub assessment: PageAssessment,
    pub page_data: PageFeatureSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[serde(alias = "HIGH", alias = "High")]
    High,
    #[default]
    #[serde(alias = "MEDIUM", alias = "Medium")]
    Medium,
    #[serde(alias = "LOW", alias = "Low")]
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonPattern {
    pub pattern: String,
    /// e.g. "4/5"
    pub frequency: String,
    pub importance: Importance,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLength {
    #[serde(deserialize_with = "lenient_count")]
    pub average: u64,
    pub range: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternAnalysis {
    pub common_patterns: Vec<CommonPattern>,
    pub content_length: ContentLength,
    pub common_elements: Vec<String>,
    pub content_structure: String,
    pub must_have_elements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalImpact {
    #[serde(alias = "STRONG", alias = "Strong")]
    Strong,
    #[default]
    #[serde(alias = "MODERATE", alias = "Moderate")]
    Moderate,
    #[serde(alias = "WEAK", alias = "Weak")]
    Weak,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginIndicator {
    pub category: String,
    pub signal: String,
    pub impact: SignalImpact,
}

/// Assessment of whether the target page text reads as machine-generated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOriginAnalysis {
    /// No default: an answer without a verdict does not parse
    #[serde(rename = "isLikelyAIGenerated")]
    pub is_likely_ai_generated: bool,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub confidence_score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub indicators: Vec<OriginIndicator>,
    #[serde(default)]
    pub human_like_qualities: Vec<String>,
    #[serde(default)]
    pub ai_like_qualities: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    #[serde(alias = "high", alias = "High")]
    High,
    #[default]
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "low", alias = "Low")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub priority: Priority,
    /// content | technical | structure | other
    pub category: String,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    /// low | medium | high
    pub effort: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationAnalysis {
    pub critical_gaps: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub quick_wins: Vec<String>,
    pub content_strategy: String,
    #[serde(rename = "technicalSEO")]
    pub technical_seo: Vec<String>,
}

/// Why part of a report is lower-confidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDiagnostic {
    pub stage: String,
    pub reason: String,
}

/// Complete analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub keyword: String,
    pub target_url: String,
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub intent_analysis: IntentAnalysis,
    pub search_results: Vec<SearchResult>,
    pub competitor_analyses: Vec<PageAnalysis>,
    pub pattern_analysis: PatternAnalysis,
    pub target_page_data: PageFeatureSet,
    /// True when the target page could not be scraped
    pub target_page_incomplete: bool,
    pub schema_health: SchemaHealthCheck,
    /// Structured data across the competitor pages
    pub competitor_schema_comparison: SchemaComparison,
    #[serde(rename = "aiContentAnalysis")]
    pub content_origin_analysis: ContentOriginAnalysis,
    pub recommendations: RecommendationAnalysis,
    pub diagnostics: Vec<StageDiagnostic>,
    pub markdown: String,
}

/// Whatever a run had gathered when it stopped early
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialReport {
    pub search_results: Vec<SearchResult>,
    pub competitor_pages_scraped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page_data: Option<PageFeatureSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_analysis: Option<IntentAnalysis>,
    pub competitor_analyses: Vec<PageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_analysis: Option<PatternAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_origin_analysis: Option<ContentOriginAnalysis>,
    pub diagnostics: Vec<StageDiagnostic>,
}
