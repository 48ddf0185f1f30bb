//! Pipeline stages and per-stage results
//!
//! Stages run strictly in declaration order:
//! SEARCH_AND_SCRAPE → INTENT → COMPETITOR_ANALYSIS → PATTERN_DETECTION →
//! CONTENT_ORIGIN → RECOMMENDATIONS → COMPLETED

use serde::{Deserialize, Serialize};

/// Analysis pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStage {
    /// Search provider lookup, competitor and target scraping
    SearchAndScrape,
    /// Search intent classification
    Intent,
    /// Per-competitor page analysis
    CompetitorAnalysis,
    /// Cross-competitor pattern detection
    PatternDetection,
    /// Generated-content likelihood of the target page
    ContentOrigin,
    /// Gap analysis and recommendations
    Recommendations,
    /// Report assembled
    Completed,
}

impl AnalysisStage {
    /// Human-readable label sent with progress notifications
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStage::SearchAndScrape => "Searching Google and scraping top 5 pages",
            AnalysisStage::Intent => "Analyzing search intent",
            AnalysisStage::CompetitorAnalysis => "Analyzing top 5 competitor pages",
            AnalysisStage::PatternDetection => "Detecting common patterns",
            AnalysisStage::ContentOrigin => "Analyzing content for AI generation",
            AnalysisStage::Recommendations => "Generating recommendations",
            AnalysisStage::Completed => "Analysis complete",
        }
    }

    /// Progress percentage reported when the stage begins
    pub fn progress(&self) -> u8 {
        match self {
            AnalysisStage::SearchAndScrape => 10,
            AnalysisStage::Intent => 30,
            AnalysisStage::CompetitorAnalysis => 50,
            AnalysisStage::PatternDetection => 60,
            AnalysisStage::ContentOrigin => 75,
            AnalysisStage::Recommendations => 90,
            AnalysisStage::Completed => 100,
        }
    }

    /// Short machine name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisStage::SearchAndScrape => "search_and_scrape",
            AnalysisStage::Intent => "intent",
            AnalysisStage::CompetitorAnalysis => "competitor_analysis",
            AnalysisStage::PatternDetection => "pattern_detection",
            AnalysisStage::ContentOrigin => "content_origin",
            AnalysisStage::Recommendations => "recommendations",
            AnalysisStage::Completed => "completed",
        }
    }
}

/// Outcome of one stage (or one unit of work inside a stage)
///
/// `Degraded` carries a structurally valid value that came from a retry or a
/// hand-authored fallback; `reason` records why, so the report can disclose
/// which parts are lower-confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageResult<T> {
    Ok { value: T },
    Degraded { value: T, reason: String },
    Failed { reason: String },
}

impl<T> StageResult<T> {
    pub fn ok(value: T) -> Self {
        StageResult::Ok { value }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        StageResult::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        StageResult::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StageResult::Ok { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StageResult::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageResult::Failed { .. })
    }

    /// Usable value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            StageResult::Ok { value } | StageResult::Degraded { value, .. } => Some(value),
            StageResult::Failed { .. } => None,
        }
    }

    /// Reason attached to a degraded or failed result
    pub fn reason(&self) -> Option<&str> {
        match self {
            StageResult::Ok { .. } => None,
            StageResult::Degraded { reason, .. } | StageResult::Failed { reason } => Some(reason),
        }
    }

    /// Split into the usable value and the degradation reason
    pub fn into_parts(self) -> (Option<T>, Option<String>) {
        match self {
            StageResult::Ok { value } => (Some(value), None),
            StageResult::Degraded { value, reason } => (Some(value), Some(reason)),
            StageResult::Failed { reason } => (None, Some(reason)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageResult<U> {
        match self {
            StageResult::Ok { value } => StageResult::Ok { value: f(value) },
            StageResult::Degraded { value, reason } => StageResult::Degraded {
                value: f(value),
                reason,
            },
            StageResult::Failed { reason } => StageResult::Failed { reason },
        }
    }
}
