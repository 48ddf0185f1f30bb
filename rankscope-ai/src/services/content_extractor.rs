//! HTML feature extraction
//!
//! Pure transformation from markup to a [`PageFeatureSet`]. The parsed
//! document never outlives [`extract`], so callers may use it freely inside
//! async code.

use crate::models::PageFeatureSet;
use crate::schema::validator::{json_ld_blocks, validate_blocks};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// Characters of body text kept on a feature set
pub const MAX_CONTENT_CHARS: usize = 10_000;

const EXCLUDED_TEXT_TAGS: [&str; 4] = ["script", "style", "noscript", "iframe"];

/// Collapse whitespace runs to single spaces and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            tracing::warn!(selector = css, error = ?e, "Invalid selector");
            Vec::new()
        }
    }
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    select(document, css)
        .into_iter()
        .find_map(|el| el.value().attr(attr).map(str::to_string))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn heading_texts(document: &Html, tag: &str) -> Vec<String> {
    select(document, tag)
        .iter()
        .map(|el| clean_text(&element_text(el)))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Visible body text, skipping script-like elements
fn body_text(document: &Html) -> String {
    let Some(body) = select(document, "body").into_iter().next() else {
        return String::new();
    };

    let mut text = String::new();
    for node in body.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| EXCLUDED_TEXT_TAGS.contains(&el.name()))
        });
        if !hidden {
            text.push_str(fragment);
        }
    }
    text
}

fn push_types(value: Option<&Value>, types: &mut Vec<String>) {
    match value {
        Some(Value::String(name)) if !name.is_empty() => types.push(name.clone()),
        Some(Value::Array(names)) => types.extend(
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        ),
        _ => {}
    }
}

/// Declared `@type` names across JSON-LD blocks, first-seen order, no repeats
fn schema_types(blocks: &[String]) -> Vec<String> {
    let mut types = Vec::new();
    for block in blocks {
        let Ok(data) = serde_json::from_str::<Value>(block) else {
            continue;
        };
        let items: Vec<&Value> = match &data {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in items {
            if item.get("@type").is_some() {
                push_types(item.get("@type"), &mut types);
            } else if let Some(Value::Array(graph)) = item.get("@graph") {
                for node in graph {
                    push_types(node.get("@type"), &mut types);
                }
            }
        }
    }

    let mut unique: Vec<String> = Vec::with_capacity(types.len());
    for t in types {
        if !unique.contains(&t) {
            unique.push(t);
        }
    }
    unique
}

/// `(internal, external)` link counts
///
/// Absolute links compare hosts with the page; any other href that is not a
/// bare fragment counts as internal.
fn count_links(document: &Html, page_url: &str) -> (usize, usize) {
    let page_host = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let mut internal = 0;
    let mut external = 0;
    for anchor in select(document, "a[href]") {
        let href = anchor.value().attr("href").unwrap_or_default();
        if href.starts_with("http") {
            let Ok(link) = Url::parse(href) else {
                continue;
            };
            match (&page_host, link.host_str()) {
                (Some(page), Some(host)) if page == host => internal += 1,
                (Some(_), _) => external += 1,
                (None, _) => {}
            }
        } else if href.starts_with('/') || !href.starts_with('#') {
            internal += 1;
        }
    }
    (internal, external)
}

/// Extract every feature the analysis stages consume
pub fn extract(html: &str, url: &str, fetched_at: DateTime<Utc>) -> PageFeatureSet {
    let document = Html::parse_document(html);

    let blocks = json_ld_blocks(&document);
    let has_schema = !blocks.is_empty();
    let schema_types = schema_types(&blocks);
    let schema_validation = validate_blocks(&blocks);

    let title = select(&document, "title")
        .first()
        .map(|el| element_text(el).trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| first_attr(&document, r#"meta[property="og:title"]"#, "content").filter(|t| !t.is_empty()))
        .or_else(|| {
            select(&document, "h1")
                .first()
                .map(|el| element_text(el).trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| "No title found".to_string());

    let meta_description = first_attr(&document, r#"meta[name="description"]"#, "content")
        .filter(|d| !d.is_empty())
        .or_else(|| first_attr(&document, r#"meta[property="og:description"]"#, "content"))
        .unwrap_or_default();

    let content = clean_text(&body_text(&document));
    let word_count = count_words(&content);
    let content_text: String = content.chars().take(MAX_CONTENT_CHARS).collect();

    let has_faq = !select(&document, r#".faq, [itemtype*="FAQPage"], [class*="faq"]"#).is_empty()
        || schema_types
            .iter()
            .any(|t| t.to_lowercase().contains("faq"));

    let (internal_links, external_links) = count_links(&document, url);

    PageFeatureSet {
        url: url.to_string(),
        title: clean_text(&title),
        meta_description: clean_text(&meta_description),
        h1_tags: heading_texts(&document, "h1"),
        h2_tags: heading_texts(&document, "h2"),
        h3_tags: heading_texts(&document, "h3"),
        content_text,
        word_count,
        has_schema,
        schema_types,
        image_count: select(&document, "img").len(),
        has_video: !select(
            &document,
            r#"video, iframe[src*="youtube"], iframe[src*="vimeo"], iframe[src*="wistia"]"#,
        )
        .is_empty(),
        has_faq,
        has_tables: !select(&document, "table").is_empty(),
        has_lists: !select(&document, "ul, ol").is_empty(),
        internal_links,
        external_links,
        fetched_at,
        scrape_status: Default::default(),
        schema_validation: Some(schema_validation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!doctype html>
<html>
<head>
  <title>  Best   Running Shoes 2024 </title>
  <meta name="description" content="Our  top picks">
  <script type="application/ld+json">
    {"@context":"https://schema.org","@graph":[{"@type":"Article"},{"@type":["FAQPage","WebPage"]}]}
  </script>
</head>
<body>
  <h1>Best Running Shoes</h1>
  <h2>Road</h2><h2>   </h2><h2>Trail</h2>
  <p>Lace up and run.</p>
  <script>var hidden = "do not count";</script>
  <style>.x { color: red }</style>
  <img src="a.png"><img src="b.png">
  <iframe src="https://www.youtube.com/embed/xyz"></iframe>
  <table><tr><td>cell</td></tr></table>
  <ul><li>one</li></ul>
  <a href="/guide">guide</a>
  <a href="https://shoes.example/about">about</a>
  <a href="https://other.example/">other</a>
  <a href="#top">top</a>
  <a href="mailto:hi@shoes.example">mail</a>
</body>
</html>"##;

    fn page() -> PageFeatureSet {
        extract(PAGE, "https://shoes.example/best", Utc::now())
    }

    #[test]
    fn test_title_and_description_are_cleaned() {
        let page = page();
        assert_eq!(page.title, "Best Running Shoes 2024");
        assert_eq!(page.meta_description, "Our top picks");
    }

    #[test]
    fn test_headings_skip_empty() {
        let page = page();
        assert_eq!(page.h1_tags, vec!["Best Running Shoes"]);
        assert_eq!(page.h2_tags, vec!["Road", "Trail"]);
        assert!(page.h3_tags.is_empty());
    }

    #[test]
    fn test_body_text_excludes_scripts_and_styles() {
        let page = page();
        assert!(page.content_text.contains("Lace up and run."));
        assert!(!page.content_text.contains("do not count"));
        assert!(!page.content_text.contains("color: red"));
        assert!(page.word_count > 0);
    }

    #[test]
    fn test_feature_flags() {
        let page = page();
        assert!(page.has_schema);
        assert_eq!(page.schema_types, vec!["Article", "FAQPage", "WebPage"]);
        assert!(page.has_faq);
        assert!(page.has_video);
        assert!(page.has_tables);
        assert!(page.has_lists);
        assert_eq!(page.image_count, 2);
        let validation = page.schema_validation.unwrap();
        assert_eq!(validation.total_schemas, 2);
    }

    #[test]
    fn test_link_classification() {
        let page = page();
        // /guide, same-host absolute, mailto
        assert_eq!(page.internal_links, 3);
        assert_eq!(page.external_links, 1);
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let page = extract(
            "<html><body><h1>Only Heading</h1></body></html>",
            "https://a.example",
            Utc::now(),
        );
        assert_eq!(page.title, "Only Heading");
        assert_eq!(
            extract("<html><body></body></html>", "https://a.example", Utc::now()).title,
            "No title found"
        );
    }

    #[test]
    fn test_content_is_truncated() {
        let long = format!("<html><body><p>{}</p></body></html>", "word ".repeat(5000));
        let page = extract(&long, "https://a.example", Utc::now());
        assert_eq!(page.content_text.chars().count(), MAX_CONTENT_CHARS);
        assert_eq!(page.word_count, 5000);
    }
}
