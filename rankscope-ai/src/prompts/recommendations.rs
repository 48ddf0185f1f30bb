use super::{join_or, yes_no, JSON_ONLY};
use crate::models::{IntentAnalysis, PageFeatureSet, PatternAnalysis};
use crate::schema::format_validation_summary;

const UNSCRAPED_NOTE: &str = "\nNOTE: The target page could not be scraped (likely blocked by anti-bot protection).\nBase recommendations on competitor patterns and best practices for this search intent.\n";

/// Longest slice of the must-have list quoted in the retry prompt
const MUST_HAVE_EXCERPT_CHARS: usize = 500;

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn primary(
    keyword: &str,
    target: &PageFeatureSet,
    patterns: &PatternAnalysis,
    intent: &IntentAnalysis,
) -> String {
    let note = if target.word_count > 0 { "" } else { UNSCRAPED_NOTE };
    let meta = if target.meta_description.is_empty() {
        "Not available"
    } else {
        target.meta_description.as_str()
    };
    let structured_data = target
        .schema_validation
        .as_ref()
        .map(format_validation_summary)
        .unwrap_or_else(|| "Not checked".to_string());

    format!(
        r#"Generate actionable SEO recommendations for a page targeting "{keyword}".

SEARCH INTENT:
{intent}

TARGET PAGE CURRENT STATE:
- URL: {url}
- Title: {title}
- Meta Description: {meta}
- Word Count: {words}
- H1: {h1}
- Has FAQ: {faq}
- Has Video: {video}
- Has Tables: {tables}
- Schema Types: {schema}

STRUCTURED DATA:
{structured_data}
{note}
COMPETITOR PATTERNS (from top ranking pages):
{patterns}

Based on this analysis, provide specific, actionable recommendations to help this page rank #1.

Return your recommendations in this exact JSON format:
{{
  "criticalGaps": ["The most important missing elements compared to top rankers"],
  "recommendations": [
    {{
      "priority": "HIGH|MEDIUM|LOW",
      "category": "content|technical|structure|other",
      "title": "Brief title of the recommendation",
      "description": "Detailed, actionable recommendation",
      "reasoning": "Why this will help rankings",
      "effort": "low|medium|high"
    }}
  ],
  "quickWins": ["2-3 easy improvements that can be done quickly"],
  "contentStrategy": "Overall content strategy recommendation",
  "technicalSEO": ["Technical SEO improvements needed"]
}}

Prioritize recommendations that address the biggest gaps.
All strings use double quotes; no comments.
{JSON_ONLY}"#,
        intent = pretty(intent),
        url = target.url,
        title = target.title,
        words = target.word_count,
        h1 = join_or(&target.h1_tags, "Not available"),
        faq = yes_no(target.has_faq),
        video = yes_no(target.has_video),
        tables = yes_no(target.has_tables),
        schema = join_or(&target.schema_types, "None"),
        patterns = pretty(patterns),
    )
}

pub fn retry(keyword: &str, target: &PageFeatureSet, patterns: &PatternAnalysis) -> String {
    let must_have: String = serde_json::to_string(&patterns.must_have_elements)
        .unwrap_or_else(|_| "[]".to_string())
        .chars()
        .take(MUST_HAVE_EXCERPT_CHARS)
        .collect();
    let faq = if target.has_faq { "" } else { "FAQ" };
    let video = if target.has_video { "" } else { "video" };

    format!(
        r#"Based on competitor analysis, provide 5 key SEO recommendations for "{keyword}".

{{
  "criticalGaps": ["gap1", "gap2", "gap3"],
  "recommendations": [
    {{
      "priority": "HIGH",
      "category": "content",
      "title": "Short title",
      "description": "Specific action to take",
      "reasoning": "Why this helps",
      "effort": "medium"
    }}
  ],
  "quickWins": ["win1", "win2"],
  "contentStrategy": "Brief strategy",
  "technicalSEO": ["item1", "item2"]
}}

Patterns found: {must_have}
Target gaps: Word count is {words}, missing: {faq} {video}

{JSON_ONLY}"#,
        words = target.word_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unscraped_target_is_called_out() {
        let target = PageFeatureSet::placeholder("https://t.example", Utc::now());
        let prompt = primary(
            "kw",
            &target,
            &PatternAnalysis::default(),
            &IntentAnalysis::default(),
        );
        assert!(prompt.contains("could not be scraped"));
        assert!(prompt.contains("Meta Description: Not available"));
    }

    #[test]
    fn test_retry_caps_must_have_excerpt() {
        let target = PageFeatureSet::placeholder("https://t.example", Utc::now());
        let patterns = PatternAnalysis {
            must_have_elements: vec!["x".repeat(2000)],
            ..Default::default()
        };
        let prompt = retry("kw", &target, &patterns);
        assert!(prompt.contains("missing: FAQ video"));
        assert!(!prompt.contains(&"x".repeat(MUST_HAVE_EXCERPT_CHARS)));
    }
}
