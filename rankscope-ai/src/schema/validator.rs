//! Rule-based checker for schema.org JSON-LD blocks
//!
//! Each object is checked against static required/recommended property
//! tables plus a few type-specific rules (FAQ nesting, article author and
//! date shape). Issue paths read `schema[i]` or `schema[i].prop`, where `i`
//! counts objects across the whole page after `@graph` expansion.

use crate::utils::json_extract::is_present;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn required_properties(schema_type: &str) -> &'static [&'static str] {
    match schema_type {
        "Article" | "BlogPosting" | "NewsArticle" => &["headline", "author", "datePublished"],
        "FAQPage" => &["mainEntity"],
        "Question" => &["name", "acceptedAnswer"],
        "Answer" => &["text"],
        "Organization" | "Person" | "Product" | "WebPage" => &["name"],
        "Review" => &["reviewRating", "author"],
        "Recipe" => &["name", "recipeIngredient", "recipeInstructions"],
        "HowTo" => &["name", "step"],
        "Event" => &["name", "startDate", "location"],
        "LocalBusiness" => &["name", "address"],
        "VideoObject" => &["name", "description", "thumbnailUrl", "uploadDate"],
        "ImageObject" => &["contentUrl"],
        "BreadcrumbList" => &["itemListElement"],
        "WebSite" => &["name", "url"],
        _ => &[],
    }
}

fn recommended_properties(schema_type: &str) -> &'static [&'static str] {
    match schema_type {
        "Article" | "BlogPosting" => &["image", "dateModified", "description"],
        "Product" => &["description", "image", "offers"],
        "Organization" => &["logo", "url", "sameAs"],
        "Person" => &["image", "jobTitle", "url"],
        "Recipe" => &["image", "totalTime", "recipeYield"],
        "LocalBusiness" => &["telephone", "priceRange", "openingHoursSpecification"],
        "Event" => &["description", "image", "organizer"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaIssue {
    #[serde(rename = "type")]
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
}

impl SchemaIssue {
    fn error(message: impl Into<String>, path: Option<String>, schema_type: Option<&str>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
            path,
            schema_type: schema_type.map(str::to_string),
        }
    }

    fn warning(message: impl Into<String>, path: Option<String>, schema_type: Option<&str>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            path,
            schema_type: schema_type.map(str::to_string),
        }
    }
}

/// Outcome for one structured-data object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidationResult {
    pub is_valid: bool,
    pub schema_type: String,
    pub errors: Vec<SchemaIssue>,
    pub warnings: Vec<SchemaIssue>,
    /// Declared keys not starting with `@`
    pub properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidationSummary {
    pub total_schemas: usize,
    pub valid_schemas: usize,
    pub invalid_schemas: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    /// De-duplicated, in first-seen order
    pub schema_types: Vec<String>,
    pub results: Vec<SchemaValidationResult>,
}

impl SchemaValidationSummary {
    /// Aggregate per-object results
    pub fn from_results(results: Vec<SchemaValidationResult>) -> Self {
        let mut schema_types: Vec<String> = Vec::new();
        for result in &results {
            if !schema_types.contains(&result.schema_type) {
                schema_types.push(result.schema_type.clone());
            }
        }
        let valid_schemas = results.iter().filter(|r| r.is_valid).count();

        Self {
            total_schemas: results.len(),
            valid_schemas,
            invalid_schemas: results.len() - valid_schemas,
            total_errors: results.iter().map(|r| r.errors.len()).sum(),
            total_warnings: results.iter().map(|r| r.warnings.len()).sum(),
            schema_types,
            results,
        }
    }
}

/// `@type` as a single name; for a type list the first name is used
fn declared_type(object: &Value) -> Option<String> {
    match object.get("@type") {
        Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| !name.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn references_schema_org(context: &Value) -> bool {
    match context {
        Value::String(s) => s.contains("schema.org"),
        Value::Array(items) => items.iter().any(references_schema_org),
        Value::Object(map) => map.values().any(references_schema_org),
        _ => false,
    }
}

fn starts_with_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// Validate one JSON-LD object found at page position `index`
pub fn validate_schema(object: &Value, index: usize) -> SchemaValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let properties: Vec<String> = object
        .as_object()
        .map(|map| {
            map.keys()
                .filter(|k| !k.starts_with('@'))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let context = object.get("@context").filter(|c| !c.is_null()).cloned();

    let Some(schema_type) = declared_type(object) else {
        errors.push(SchemaIssue::error(
            "Missing required @type property",
            Some(format!("schema[{index}]")),
            None,
        ));
        return SchemaValidationResult {
            is_valid: false,
            schema_type: "Unknown".to_string(),
            errors,
            warnings,
            properties,
            context,
        };
    };
    let ty = Some(schema_type.as_str());

    match object.get("@context") {
        Some(ctx) if is_present(ctx) => {
            if !references_schema_org(ctx) {
                warnings.push(SchemaIssue::warning(
                    "Unexpected @context value, should reference schema.org",
                    None,
                    ty,
                ));
            }
        }
        _ => warnings.push(SchemaIssue::warning(
            "Missing @context property (recommended: https://schema.org)",
            None,
            ty,
        )),
    }

    for prop in required_properties(&schema_type) {
        if !object.get(*prop).is_some_and(is_present) {
            errors.push(SchemaIssue::error(
                format!("Missing required property: {prop}"),
                Some(format!("schema[{index}].{prop}")),
                ty,
            ));
        }
    }

    for prop in recommended_properties(&schema_type) {
        if !object.get(*prop).is_some_and(is_present) {
            warnings.push(SchemaIssue::warning(
                format!("Missing recommended property: {prop}"),
                Some(format!("schema[{index}].{prop}")),
                ty,
            ));
        }
    }

    if schema_type == "FAQPage" {
        if let Some(main_entity) = object.get("mainEntity").filter(|v| is_present(v)) {
            let questions: Vec<&Value> = match main_entity {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            for (q, question) in questions.into_iter().enumerate() {
                check_faq_question(question, index, q, ty, &mut errors);
            }
        }
    }

    if schema_type == "Article" || schema_type == "BlogPosting" {
        if let Some(Value::String(author)) = object.get("author") {
            if !author.is_empty() {
                warnings.push(SchemaIssue::warning(
                    "Author should be a Person or Organization object, not a string",
                    Some(format!("schema[{index}].author")),
                    ty,
                ));
            }
        }

        if let Some(published) = object.get("datePublished").filter(|v| is_present(v)) {
            let well_formed = published.as_str().is_some_and(starts_with_iso_date);
            if !well_formed {
                warnings.push(SchemaIssue::warning(
                    "datePublished should be in ISO 8601 format (YYYY-MM-DD)",
                    Some(format!("schema[{index}].datePublished")),
                    ty,
                ));
            }
        }
    }

    SchemaValidationResult {
        is_valid: errors.is_empty(),
        schema_type,
        errors,
        warnings,
        properties,
        context,
    }
}

fn check_faq_question(
    question: &Value,
    index: usize,
    q: usize,
    ty: Option<&str>,
    errors: &mut Vec<SchemaIssue>,
) {
    if question.get("@type").and_then(Value::as_str) != Some("Question") {
        errors.push(SchemaIssue::error(
            format!("FAQPage mainEntity[{q}] must be of type Question"),
            Some(format!("schema[{index}].mainEntity[{q}]")),
            ty,
        ));
    }

    match question.get("acceptedAnswer").filter(|v| is_present(v)) {
        None => errors.push(SchemaIssue::error(
            format!("Question[{q}] missing acceptedAnswer"),
            Some(format!("schema[{index}].mainEntity[{q}].acceptedAnswer")),
            ty,
        )),
        Some(answer) if answer.get("@type").and_then(Value::as_str) != Some("Answer") => {
            errors.push(SchemaIssue::error(
                format!("Question[{q}] acceptedAnswer must be of type Answer"),
                Some(format!("schema[{index}].mainEntity[{q}].acceptedAnswer")),
                ty,
            ))
        }
        Some(_) => {}
    }
}

fn parse_failure(message: String, index: usize) -> SchemaValidationResult {
    SchemaValidationResult {
        is_valid: false,
        schema_type: "ParseError".to_string(),
        errors: vec![SchemaIssue::error(
            format!("Failed to parse JSON-LD: {message}"),
            Some(format!("schema[{index}]")),
            None,
        )],
        warnings: Vec::new(),
        properties: Vec::new(),
        context: None,
    }
}

/// Raw text of every `<script type="application/ld+json">` block
pub fn json_ld_blocks(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|script| script.text().collect::<String>().trim().to_string())
        .collect()
}

/// Validate already-extracted JSON-LD block texts
///
/// `@graph` arrays and top-level arrays expand into their items; a block
/// that is not valid JSON becomes one `ParseError` result.
pub fn validate_blocks<S: AsRef<str>>(blocks: &[S]) -> SchemaValidationSummary {
    let mut results = Vec::new();
    let mut index = 0usize;

    for block in blocks {
        match serde_json::from_str::<Value>(block.as_ref()) {
            Ok(data) => {
                let items: Vec<&Value> = match &data {
                    Value::Object(map) => match map.get("@graph") {
                        Some(Value::Array(graph)) => graph.iter().collect(),
                        _ => vec![&data],
                    },
                    Value::Array(items) => items.iter().collect(),
                    _ => vec![&data],
                };
                for item in items {
                    results.push(validate_schema(item, index));
                    index += 1;
                }
            }
            Err(e) => {
                results.push(parse_failure(e.to_string(), index));
                index += 1;
            }
        }
    }

    SchemaValidationSummary::from_results(results)
}

/// Validate every JSON-LD block in a page's markup
pub fn validate_page_schemas(html: &str) -> SchemaValidationSummary {
    let document = Html::parse_document(html);
    validate_blocks(&json_ld_blocks(&document))
}

/// Plain-text digest of a page summary
pub fn format_validation_summary(summary: &SchemaValidationSummary) -> String {
    if summary.total_schemas == 0 {
        return "No structured data found.".to_string();
    }

    [
        format!("Found {} schema(s):", summary.total_schemas),
        format!("- Valid: {}", summary.valid_schemas),
        format!("- Invalid: {}", summary.invalid_schemas),
        format!("- Total Errors: {}", summary.total_errors),
        format!("- Total Warnings: {}", summary.total_warnings),
        format!("- Types: {}", summary.schema_types.join(", ")),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iso_date_prefix() {
        assert!(starts_with_iso_date("2024-01-15"));
        assert!(starts_with_iso_date("2024-01-15T10:00:00Z"));
        assert!(!starts_with_iso_date("January 15, 2024"));
        assert!(!starts_with_iso_date("2024-1-15"));
    }

    #[test]
    fn test_type_list_uses_first_name() {
        let result = validate_schema(
            &json!({"@context": "https://schema.org", "@type": ["WebSite", "Thing"], "name": "x", "url": "https://x"}),
            0,
        );
        assert_eq!(result.schema_type, "WebSite");
        assert!(result.is_valid);
    }

    #[test]
    fn test_context_object_referencing_schema_org() {
        let result = validate_schema(
            &json!({"@context": {"@vocab": "https://schema.org/"}, "@type": "WebPage", "name": "x"}),
            0,
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_non_object_item_reports_missing_type() {
        let result = validate_schema(&json!("just a string"), 3);
        assert_eq!(result.schema_type, "Unknown");
        assert_eq!(result.errors[0].path.as_deref(), Some("schema[3]"));
    }

    #[test]
    fn test_summary_text() {
        let summary = validate_blocks(&[r#"{"@context":"https://schema.org","@type":"WebPage","name":"Home"}"#]);
        let text = format_validation_summary(&summary);
        assert!(text.starts_with("Found 1 schema(s):"));
        assert!(text.contains("- Types: WebPage"));
        assert_eq!(
            format_validation_summary(&SchemaValidationSummary::default()),
            "No structured data found."
        );
    }
}
