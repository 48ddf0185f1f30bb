use super::{preview, JSON_ONLY};
use crate::models::PageFeatureSet;

/// Characters of page text shown to the model
const SAMPLE_CHARS: usize = 4000;

pub fn primary(keyword: &str, page: &PageFeatureSet) -> String {
    format!(
        r#"Assess whether the following page content, which targets "{keyword}", reads as AI-generated or human-written.

URL: {url}
Title: {title}
Word Count: {words}

Content Sample:
{sample}

Weigh signals such as repetitive phrasing, generic transitions, uniform sentence rhythm, lack of first-hand experience, specific data or anecdotes, and distinctive voice.

Provide your assessment in JSON format:
{{
  "isLikelyAIGenerated": true,
  "confidenceScore": 70,
  "summary": "One or two sentence verdict",
  "indicators": [
    {{
      "category": "style|structure|specificity|voice",
      "signal": "What was observed",
      "impact": "strong|moderate|weak"
    }}
  ],
  "humanLikeQualities": ["Qualities that suggest a human author"],
  "aiLikeQualities": ["Qualities that suggest generated text"],
  "recommendation": "How to make the content read as more authentic"
}}

{JSON_ONLY}"#,
        url = page.url,
        title = page.title,
        words = page.word_count,
        sample = preview(&page.content_text, SAMPLE_CHARS),
    )
}

pub fn retry(page: &PageFeatureSet) -> String {
    format!(
        r#"Does this text read as AI-generated?

{sample}

Return exactly this JSON object and nothing else:
{{"isLikelyAIGenerated": false, "confidenceScore": 50, "summary": "...", "indicators": [], "humanLikeQualities": [], "aiLikeQualities": [], "recommendation": "..."}}

confidenceScore is 0-100.
{JSON_ONLY}"#,
        sample = preview(&page.content_text, SAMPLE_CHARS / 4),
    )
}
