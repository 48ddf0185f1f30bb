//! Recover a JSON object from free-form model output
//!
//! Escalation, each step only when the previous one fails:
//! 1. strip an enclosing code fence and parse
//! 2. apply the repair cascade and parse
//! 3. take the greedy `{ ... }` span, repair it and parse
//! 4. report a failure with an excerpt around the error position
//!
//! The repairs are textual and run in a fixed order; the order matters
//! because later rules assume earlier ones already ran.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Characters of context kept on each side of a parse error
const EXCERPT_RADIUS: usize = 200;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```$").expect("Failed to compile fence regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("Failed to compile trailing comma regex"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("Failed to compile line comment regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Failed to compile block comment regex"));
static SINGLE_QUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\{|,)\s*'([^']+)'\s*:").expect("Failed to compile single-quoted key regex")
});
static ADJACENT_OBJECTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}(\s*)\{").expect("Failed to compile adjacent object regex"));
static ADJACENT_ARRAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\](\s*)\[").expect("Failed to compile adjacent array regex"));
static ADJACENT_STRINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(\s*)\n(\s*)""#).expect("Failed to compile adjacent string regex")
});
static OBJECT_THEN_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\}(\s*)""#).expect("Failed to compile object-key regex"));
static ARRAY_THEN_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\](\s*)""#).expect("Failed to compile array-key regex"));

/// Model output that could not be recovered as JSON
#[derive(Debug, Clone, Error)]
#[error("Failed to parse JSON: {message} (input length {length})")]
pub struct JsonExtractError {
    pub message: String,
    /// Length in characters of the cleaned input
    pub length: usize,
    /// Text surrounding the reported error position
    pub excerpt: String,
}

/// JavaScript-style truthiness
///
/// Absent-equivalent values are `null`, `false`, `""`, `0` and NaN; empty
/// arrays and objects count as present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Names of `fields` that are absent or falsy in `value`
pub fn missing_fields<'a>(value: &Value, fields: &[&'a str]) -> Vec<&'a str> {
    fields
        .iter()
        .copied()
        .filter(|field| !value.get(*field).is_some_and(is_present))
        .collect()
}

/// Replace matches of `re` only where some `:` follows the match
fn replace_when_key_follows(re: &Regex, text: &str, build: impl Fn(&Captures) -> String) -> String {
    re.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map(|m| (m.start(), m.end()));
        match whole {
            // The trailing quote opens a token; a key needs a colon after it
            Some((_, end)) if text[end..].contains(':') => build(caps),
            Some((start, end)) => text[start..end].to_string(),
            None => String::new(),
        }
    })
    .into_owned()
}

/// The repair cascade, applied in order
pub fn repair_json(text: &str) -> String {
    let fixed = TRAILING_COMMA.replace_all(text, "$1");
    let fixed = LINE_COMMENT.replace_all(&fixed, "");
    let fixed = BLOCK_COMMENT.replace_all(&fixed, "");
    let fixed = SINGLE_QUOTED_KEY.replace_all(&fixed, "$1\"$2\":");
    let fixed = ADJACENT_OBJECTS.replace_all(&fixed, "},$1{");
    let fixed = ADJACENT_ARRAYS.replace_all(&fixed, "],$1[");
    let fixed = replace_when_key_follows(&ADJACENT_STRINGS, &fixed, |caps| {
        format!("\",{}\n{}\"", &caps[1], &caps[2])
    });
    let fixed = replace_when_key_follows(&OBJECT_THEN_KEY, &fixed, |caps| {
        format!("}},{}\"", &caps[1])
    });
    ARRAY_THEN_KEY.replace_all(&fixed, "],$1\"").into_owned()
}

/// Body of an enclosing code fence, or the trimmed text itself
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Byte offset of a serde_json error's line/column within `text`
fn error_offset(text: &str, err: &serde_json::Error) -> usize {
    let line = err.line().max(1);
    let column = err.column().saturating_sub(1);
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let mut offset = (line_start + column).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn excerpt_around(text: &str, byte_offset: usize) -> String {
    let center = text[..byte_offset].chars().count();
    let start = center.saturating_sub(EXCERPT_RADIUS);
    text.chars()
        .skip(start)
        .take(center - start + EXCERPT_RADIUS)
        .collect()
}

/// Recover a structurally valid JSON value from model output
pub fn extract_json(text: &str) -> Result<Value, JsonExtractError> {
    let cleaned = strip_fence(text);

    let first_error = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    debug!(error = %first_error, "Initial JSON parse failed, applying repairs");

    let repaired = repair_json(cleaned);
    let mut failure = match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => return Ok(value),
        Err(e) => (repaired, e),
    };
    debug!(error = %failure.1, "Repaired JSON parse failed, extracting object span");

    if let (Some(open), Some(close)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if open < close {
            let span = repair_json(&cleaned[open..=close]);
            match serde_json::from_str::<Value>(&span) {
                Ok(value) => return Ok(value),
                Err(e) => failure = (span, e),
            }
        }
    }

    let (failed_text, err) = failure;
    let excerpt = excerpt_around(&failed_text, error_offset(&failed_text, &err));
    Err(JsonExtractError {
        message: err.to_string(),
        length: cleaned.chars().count(),
        excerpt: if excerpt.is_empty() {
            cleaned.chars().take(EXCERPT_RADIUS * 2).collect()
        } else {
            excerpt
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(0.0)));
        assert!(is_present(&json!([])));
        assert!(is_present(&json!({})));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!(-1)));
    }

    #[test]
    fn test_missing_fields_reports_in_order() {
        let value = json!({"intent": "commercial", "userGoal": "", "confidence": 0});
        assert_eq!(
            missing_fields(&value, &["intent", "userGoal", "buyerStage"]),
            vec!["userGoal", "buyerStage"]
        );
    }

    #[test]
    fn test_strip_fence_without_language() {
        assert_eq!(strip_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_error_offset_multiline() {
        let text = "{\n  \"a\": 1,\n  oops\n}";
        let err = serde_json::from_str::<Value>(text).unwrap_err();
        let offset = error_offset(text, &err);
        assert!(text[offset..].starts_with('o') || text[..offset].ends_with('o'));
    }
}
