use super::{join_or, JSON_ONLY};
use crate::models::PageAnalysis;

fn summaries(analyses: &[PageAnalysis]) -> String {
    analyses
        .iter()
        .map(|a| {
            let strengths: Vec<String> = a
                .assessment
                .strengths
                .iter()
                .map(|s| s.description().to_string())
                .collect();
            format!(
                "#{}: {}\n  Content Type: {}\n  Word Count: {}\n  Key Elements: {}\n  Strengths: {}",
                a.position,
                a.title,
                a.assessment.content_type,
                a.page_data.word_count,
                join_or(&a.assessment.key_elements, "None"),
                join_or(&strengths, "None"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn primary(keyword: &str, analyses: &[PageAnalysis]) -> String {
    format!(
        r#"Identify common patterns across these top {count} ranking pages for "{keyword}":

{summaries}

Find patterns that appear in 3 or more pages. These patterns are likely important for ranking.

Provide your analysis in JSON format:
{{
  "commonPatterns": [
    {{
      "pattern": "Description of the pattern",
      "frequency": "Number of pages (e.g., 4/5)",
      "importance": "high|medium|low",
      "examples": ["Brief examples from the pages"]
    }}
  ],
  "contentLength": {{
    "average": 0,
    "range": "X - Y words",
    "recommendation": "Recommended word count range"
  }},
  "commonElements": ["Elements found in most pages (FAQ, tables, etc.)"],
  "contentStructure": "How top pages structure their content",
  "mustHaveElements": ["Critical elements needed to compete"]
}}

{JSON_ONLY}"#,
        count = analyses.len(),
        summaries = summaries(analyses),
    )
}

pub fn retry(keyword: &str, analyses: &[PageAnalysis]) -> String {
    let word_counts = analyses
        .iter()
        .map(|a| a.page_data.word_count.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let content_types = analyses
        .iter()
        .map(|a| a.assessment.content_type.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Top pages for "{keyword}" have word counts {word_counts} and content types {content_types}.

Return exactly this JSON object and nothing else:
{{"commonPatterns": [{{"pattern": "...", "frequency": "3/5", "importance": "high", "examples": ["..."]}}], "contentLength": {{"average": 1500, "range": "1000 - 2000 words", "recommendation": "..."}}, "commonElements": ["..."], "contentStructure": "...", "mustHaveElements": ["..."]}}

{JSON_ONLY}"#
    )
}
