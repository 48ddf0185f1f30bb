use super::{join_or, join_truncated, preview, yes_no, JSON_ONLY};
use crate::models::PageFeatureSet;

const SELECTOR_GUIDE: &str = r##"For strengths, identify 3-5 key elements that help this page rank well, with CSS selectors that would capture each element visually.
Only include visually distinct elements: FAQ sections, comparison tables, hero banners, pricing tables, infographics, product galleries, feature showcases.
Skip code blocks, plain text paragraphs, navigation menus, footers and sidebars.

Common selector patterns:
- FAQ sections: "#faq, .faq, .faqs, [itemtype*='FAQPage'], .faq-section"
- Comparison tables: "table.comparison, .comparison-table, .vs-table"
- Hero sections: "#hero, .hero, .hero-section, .hero-banner"
- Pricing tables: "#pricing, .pricing, .pricing-table, .plans"
- Feature lists: ".features, .feature-list, #features, .feature-grid"
- Video embeds: ".video-container, .video-wrapper"
- CTA sections: ".cta, .call-to-action, #cta""##;

pub fn primary(keyword: &str, page: &PageFeatureSet, position: u32) -> String {
    format!(
        r#"Analyze this page that ranks #{position} for "{keyword}":

URL: {url}
Title: {title}
Meta Description: {meta}

Heading Structure:
H1: {h1}
H2 Tags ({h2_count}): {h2}
H3 Tags ({h3_count}): {h3}

Content Stats:
- Word Count: {words}
- Images: {images}
- Has Video: {video}
- Has FAQ: {faq}
- Has Tables: {tables}
- Has Lists: {lists}
- Schema Types: {schema}
- Internal Links: {internal}
- External Links: {external}

Content Preview (first 1000 chars):
{content}...

Analyze this page and provide insights in JSON format:
{{
  "strengths": [
    {{
      "description": "What this element does well for SEO",
      "selector": "CSS selector(s) for the element, comma-separated",
      "selectorFallback": "Generic fallback selector"
    }}
  ],
  "contentType": "tutorial|guide|comparison|product-page|listicle|tool|other",
  "keyElements": ["Notable content elements like calculators, comparisons, etc."],
  "targetAudience": "Who this content is for",
  "contentDepth": "shallow|moderate|comprehensive",
  "notes": "Any other relevant observations"
}}

{SELECTOR_GUIDE}

{JSON_ONLY}"#,
        url = page.url,
        title = page.title,
        meta = page.meta_description,
        h1 = join_or(&page.h1_tags, "None"),
        h2_count = page.h2_tags.len(),
        h2 = join_truncated(&page.h2_tags, 10),
        h3_count = page.h3_tags.len(),
        h3 = join_truncated(&page.h3_tags, 5),
        words = page.word_count,
        images = page.image_count,
        video = yes_no(page.has_video),
        faq = yes_no(page.has_faq),
        tables = yes_no(page.has_tables),
        lists = yes_no(page.has_lists),
        schema = join_or(&page.schema_types, "None"),
        internal = page.internal_links,
        external = page.external_links,
        content = preview(&page.content_text, 1000),
    )
}

pub fn retry(keyword: &str, page: &PageFeatureSet, position: u32) -> String {
    format!(
        r#"Page #{position} for "{keyword}": {title} ({url}), {words} words, headings: {h2}.

Return exactly this JSON object and nothing else:
{{"strengths": ["strength 1", "strength 2", "strength 3"], "contentType": "guide", "keyElements": ["element"], "targetAudience": "...", "contentDepth": "moderate", "notes": "..."}}

{JSON_ONLY}"#,
        title = page.title,
        url = page.url,
        words = page.word_count,
        h2 = join_truncated(&page.h2_tags, 5),
    )
}
