//! Hand-written mock collaborators
//!
//! `ScriptedModel` answers by recognizing which stage a prompt belongs to,
//! so one instance can drive a full pipeline run.

use async_trait::async_trait;
use rankscope_ai::llm::{GenerateOptions, Generation, LanguageModel, LlmError, ModelFactory};
use rankscope_ai::models::{ModelId, SearchResult};
use rankscope_ai::services::{FetchError, PageFetcher, SearchError, SearchOptions, SearchProvider};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Search provider returning a fixed result list
pub struct MockSearch {
    results: Vec<SearchResult>,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(
        &self,
        keyword: &str,
        _options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.results.is_empty() {
            return Err(SearchError::NoResults(keyword.to_string()));
        }
        Ok(self.results.clone())
    }
}

/// Fetcher serving canned markup; unknown URLs answer 404
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn without_page(mut self, url: &str) -> Self {
        self.pages.remove(url);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

/// Stage a prompt was written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Intent,
    Page,
    Patterns,
    ContentOrigin,
    Recommendations,
    Unknown,
}

pub fn classify(prompt: &str) -> PromptKind {
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| prompt.starts_with(p));
    if starts(&["Analyze the search intent", "Classify the search intent"]) {
        PromptKind::Intent
    } else if starts(&["Analyze this page that ranks", "Page #"]) {
        PromptKind::Page
    } else if starts(&["Identify common patterns", "Top pages for"]) {
        PromptKind::Patterns
    } else if starts(&["Assess whether", "Does this text"]) {
        PromptKind::ContentOrigin
    } else if starts(&["Generate actionable SEO", "Based on competitor analysis"]) {
        PromptKind::Recommendations
    } else {
        PromptKind::Unknown
    }
}

pub fn intent_json() -> String {
    json!({
        "intent": "commercial",
        "userGoal": "Compare running shoes before buying",
        "buyerStage": "consideration",
        "confidence": 85,
        "reasoning": "Results are review roundups"
    })
    .to_string()
}

pub fn page_json() -> String {
    json!({
        "strengths": ["Clear comparison table", {"description": "FAQ block", "selector": ".faq"}],
        "contentType": "listicle",
        "keyElements": ["comparison table"],
        "targetAudience": "Recreational runners",
        "contentDepth": "comprehensive",
        "notes": ""
    })
    .to_string()
}

pub fn patterns_json() -> String {
    json!({
        "commonPatterns": [
            {"pattern": "Comparison table near the top", "frequency": "4/5", "importance": "high", "examples": []}
        ],
        "contentLength": {"average": 1800, "range": "1200 - 2500 words", "recommendation": "Aim for 2000 words"},
        "commonElements": ["FAQ"],
        "contentStructure": "Listicle with buying guide",
        "mustHaveElements": ["FAQ", "Comparison table"]
    })
    .to_string()
}

pub fn content_origin_json() -> String {
    json!({
        "isLikelyAIGenerated": false,
        "confidenceScore": 70,
        "summary": "Reads as first-hand testing notes",
        "indicators": [{"category": "voice", "signal": "Personal anecdotes", "impact": "strong"}],
        "humanLikeQualities": ["Specific anecdotes"],
        "aiLikeQualities": [],
        "recommendation": "Keep the first-person testing notes"
    })
    .to_string()
}

pub fn recommendations_json() -> String {
    json!({
        "criticalGaps": ["No FAQ section"],
        "recommendations": [
            {"priority": "LOW", "category": "technical", "title": "Compress images", "description": "d", "reasoning": "r", "effort": "low"},
            {"priority": "HIGH", "category": "content", "title": "Add a comparison table", "description": "d", "reasoning": "r", "effort": "medium"}
        ],
        "quickWins": ["Rewrite the meta description"],
        "contentStrategy": "Expand into a tested buying guide",
        "technicalSEO": ["Add FAQPage schema"]
    })
    .to_string()
}

/// Language model with per-stage canned answers
///
/// By default every stage answers well-formed JSON. Stages can be broken
/// (garbage on every attempt), and individual competitor pages can be
/// broken by URL.
#[derive(Default)]
pub struct ScriptedModel {
    broken_stages: HashSet<PromptKind>,
    broken_urls: Vec<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<PromptKind>>,
}

impl ScriptedModel {
    pub fn well_behaved() -> Self {
        Self::default()
    }

    pub fn breaking_stage(mut self, kind: PromptKind) -> Self {
        self.broken_stages.insert(kind);
        self
    }

    pub fn breaking_page(mut self, url: &str) -> Self {
        self.broken_urls.push(url.to_string());
        self
    }

    /// Sleep this long before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<PromptKind> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, kind: PromptKind, prompt: &str) -> String {
        if self.broken_stages.contains(&kind) {
            return "I'm sorry, I can't produce that.".to_string();
        }
        match kind {
            PromptKind::Page if self.broken_urls.iter().any(|u| prompt.contains(u.as_str())) => {
                "{this is not json".to_string()
            }
            PromptKind::Intent => intent_json(),
            PromptKind::Page => format!("```json\n{}\n```", page_json()),
            PromptKind::Patterns => patterns_json(),
            PromptKind::ContentOrigin => content_origin_json(),
            PromptKind::Recommendations => recommendations_json(),
            PromptKind::Unknown => "{}".to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> ModelId {
        ModelId::ClaudeSonnet45
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<Generation, LlmError> {
        let kind = classify(prompt);
        self.calls.lock().unwrap().push(kind);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Generation {
            text: self.answer(kind, prompt),
            tokens_used: Some(100),
        })
    }
}

/// Factory handing out one shared model, or reporting a missing key
pub struct MockFactory {
    model: Option<Arc<ScriptedModel>>,
}

impl MockFactory {
    pub fn with(model: Arc<ScriptedModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn without_keys() -> Self {
        Self { model: None }
    }
}

impl ModelFactory for MockFactory {
    fn create(&self, model: ModelId) -> Result<Arc<dyn LanguageModel>, LlmError> {
        match &self.model {
            Some(m) => Ok(m.clone()),
            None => Err(LlmError::MissingApiKey(match model.provider() {
                rankscope_ai::models::Provider::Anthropic => "ANTHROPIC_API_KEY",
                rankscope_ai::models::Provider::OpenAi => "OPENAI_API_KEY",
            })),
        }
    }
}
