use super::JSON_ONLY;
use crate::models::SearchResult;

pub fn primary(keyword: &str, results: &[SearchResult]) -> String {
    let listing = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}\n   URL: {}\n   Snippet: {}",
                i + 1,
                r.title,
                r.url,
                r.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Analyze the search intent for the keyword: "{keyword}"

Based on the top Google search results below, determine:
1. The primary search intent (informational, transactional, navigational, or commercial investigation)
2. The specific user goal or question being answered
3. The buyer journey stage (awareness, consideration, decision)
4. Confidence level (0-100%)

Top Results:
{listing}

Provide your analysis in the following JSON format:
{{
  "intent": "informational|transactional|navigational|commercial",
  "userGoal": "Description of what the user is trying to accomplish",
  "buyerStage": "awareness|consideration|decision",
  "confidence": 85,
  "reasoning": "Brief explanation of your classification"
}}

{JSON_ONLY}"#
    )
}

pub fn retry(keyword: &str, results: &[SearchResult]) -> String {
    let titles = results
        .iter()
        .map(|r| format!("- {}", r.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Classify the search intent of "{keyword}" from these result titles:
{titles}

Return exactly this JSON object and nothing else:
{{"intent": "informational", "userGoal": "...", "buyerStage": "awareness", "confidence": 70, "reasoning": "..."}}

intent is one of informational, transactional, navigational, commercial.
buyerStage is one of awareness, consideration, decision.
{JSON_ONLY}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_list_results() {
        let results = vec![SearchResult {
            position: 1,
            title: "Ten best shoes".to_string(),
            url: "https://a.example".to_string(),
            snippet: "Reviewed".to_string(),
            domain: "a.example".to_string(),
        }];
        let prompt = primary("running shoes", &results);
        assert!(prompt.contains("1. Ten best shoes"));
        assert!(prompt.contains("\"userGoal\""));
        assert!(retry("running shoes", &results).contains("- Ten best shoes"));
    }
}
