//! Data models for rankscope-ai
//!
//! - Request validation and model identifiers
//! - Search results and scraped page features
//! - Stage ordering and per-stage results
//! - Stage outputs and the aggregated report

pub mod analysis;
pub mod page;
pub mod request;
pub mod stage;

pub use analysis::{
    AnalysisReport, CommonPattern, ContentLength, ContentOriginAnalysis, Importance,
    IntentAnalysis, OriginIndicator, PageAnalysis, PageAssessment, PartialReport,
    PatternAnalysis, Priority, Recommendation, RecommendationAnalysis, SignalImpact,
    StageDiagnostic, Strength,
};
pub use page::{PageFeatureSet, ScrapeStatus, SearchResult, PLACEHOLDER_CONTENT, PLACEHOLDER_TITLE};
pub use request::{AnalysisRequest, ModelId, Provider, ValidationError, MAX_KEYWORD_CHARS};
pub use stage::{AnalysisStage, StageResult};
