//! Prompt builders for the generative stages
//!
//! Each stage has a full primary prompt and a shorter retry prompt that
//! restates only the JSON shape. Both end with the same strict-JSON reminder.

pub mod content_origin;
pub mod intent;
pub mod page;
pub mod patterns;
pub mod recommendations;

/// Closing line appended to every prompt
pub(crate) const JSON_ONLY: &str =
    "Return only valid JSON with no trailing commas, no additional text.";

/// Join non-empty items, or `fallback` when there are none
pub(crate) fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

/// At most `limit` items, with `...` when some were left out
pub(crate) fn join_truncated(items: &[String], limit: usize) -> String {
    let shown = items
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > limit {
        format!("{shown}...")
    } else {
        shown
    }
}

/// First `limit` characters of `text`
pub(crate) fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_helpers() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_or(&[], "None"), "None");
        assert_eq!(join_or(&items, "None"), "a, b, c");
        assert_eq!(join_truncated(&items, 2), "a, b...");
        assert_eq!(join_truncated(&items, 3), "a, b, c");
        assert_eq!(preview("héllo", 2), "hé");
    }
}
