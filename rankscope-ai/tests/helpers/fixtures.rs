//! Page and search fixtures

use rankscope_ai::models::SearchResult;

pub const TARGET_URL: &str = "https://example.com/our-guide";

pub fn competitor_urls() -> Vec<String> {
    (1..=5)
        .map(|i| format!("https://competitor{i}.com/best-running-shoes"))
        .collect()
}

/// Top five organic results pointing at `competitor_urls()`
pub fn search_results() -> Vec<SearchResult> {
    competitor_urls()
        .into_iter()
        .enumerate()
        .map(|(i, url)| SearchResult {
            position: i as u32 + 1,
            title: format!("Best Running Shoes {} | Competitor {}", 2024, i + 1),
            domain: format!("competitor{}.com", i + 1),
            url,
            snippet: "Our experts tested dozens of shoes.".to_string(),
        })
        .collect()
}

/// Article page with `words` words of body copy and a complete Article schema
pub fn article_page(title: &str, words: usize) -> String {
    let body = vec!["running"; words].join(" ");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
  <meta name="description" content="A guide to {title}">
  <script type="application/ld+json">
  {{
    "@context": "https://schema.org",
    "@type": "Article",
    "headline": "{title}",
    "author": {{"@type": "Person", "name": "Sam Writer"}},
    "datePublished": "2024-03-01",
    "dateModified": "2024-04-01",
    "image": "https://example.com/cover.jpg",
    "description": "A guide"
  }}
  </script>
</head>
<body>
  <h1>{title}</h1>
  <h2>How we tested</h2>
  <p>{body}</p>
  <h2>FAQ</h2>
  <ul><li>one</li><li>two</li></ul>
  <a href="/about">About</a>
</body>
</html>"#
    )
}
