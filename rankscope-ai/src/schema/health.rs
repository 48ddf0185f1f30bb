//! Page-level structured data health scoring and cross-page comparison

use super::validator::SchemaValidationSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaHealthCheck {
    pub status: HealthStatus,
    /// 0–100
    pub score: u32,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score a page's structured data
///
/// Starts at 100 and deducts for absence (50), the invalid ratio (up to 30),
/// any errors (20) and warnings (2 each, at most 10). Status is judged on the
/// unrounded score.
pub fn check_schema_health(validation: &SchemaValidationSummary) -> SchemaHealthCheck {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut score = 100.0_f64;

    if validation.total_schemas == 0 {
        issues.push("No structured data found on page".to_string());
        recommendations.push("Add JSON-LD schema markup to improve SEO".to_string());
        score -= 50.0;
    }

    if validation.invalid_schemas > 0 {
        issues.push(format!(
            "{} schema(s) failed validation",
            validation.invalid_schemas
        ));
        recommendations.push("Fix schema validation errors to ensure proper indexing".to_string());
        score -= 30.0 * (validation.invalid_schemas as f64 / validation.total_schemas.max(1) as f64);
    }

    if validation.total_errors > 0 {
        issues.push(format!(
            "{} critical error(s) found in schema markup",
            validation.total_errors
        ));
        recommendations.push(
            "Address all schema errors - they prevent proper interpretation by search engines"
                .to_string(),
        );
        score -= 20.0;
    }

    if validation.total_warnings > 0 {
        issues.push(format!(
            "{} warning(s) in schema implementation",
            validation.total_warnings
        ));
        recommendations.push("Review warnings to improve schema quality".to_string());
        score -= (validation.total_warnings as f64 * 2.0).min(10.0);
    }

    let has_type = |names: &[&str]| {
        validation
            .schema_types
            .iter()
            .any(|t| names.contains(&t.as_str()))
    };

    if !has_type(&["Article", "BlogPosting", "NewsArticle"]) && validation.total_schemas > 0 {
        recommendations
            .push("Consider adding Article schema for better content representation".to_string());
    }
    if !has_type(&["Organization"]) {
        recommendations.push("Add Organization schema to establish site identity".to_string());
    }
    if !has_type(&["BreadcrumbList"]) {
        recommendations
            .push("Add BreadcrumbList schema to improve navigation in search results".to_string());
    }

    let status = if score >= 80.0 {
        HealthStatus::Healthy
    } else if score >= 50.0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Critical
    };

    SchemaHealthCheck {
        status,
        score: score.round().max(0.0) as u32,
        issues,
        recommendations,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaComparison {
    pub average_schema_count: f64,
    pub average_valid_schemas: f64,
    pub average_error_count: f64,
    /// Types present on at least half the pages
    pub common_schema_types: Vec<String>,
    pub best_implementation: String,
    pub worst_implementation: String,
}

/// Compare structured data across pages given as `(url, summary)`
pub fn compare_schemas(pages: &[(String, SchemaValidationSummary)]) -> SchemaComparison {
    if pages.is_empty() {
        return SchemaComparison::default();
    }

    let count = pages.len() as f64;
    let total_schemas: usize = pages.iter().map(|(_, v)| v.total_schemas).sum();
    let total_valid: usize = pages.iter().map(|(_, v)| v.valid_schemas).sum();
    let total_errors: usize = pages.iter().map(|(_, v)| v.total_errors).sum();

    let mut type_counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for (_, validation) in pages {
        for schema_type in &validation.schema_types {
            let entry = type_counts.entry(schema_type.as_str()).or_insert(0);
            if *entry == 0 {
                first_seen.push(schema_type.as_str());
            }
            *entry += 1;
        }
    }
    let common_schema_types = first_seen
        .into_iter()
        .filter(|t| type_counts.get(t).copied().unwrap_or(0) as f64 >= count * 0.5)
        .map(str::to_string)
        .collect();

    let mut scored: Vec<(&str, u32)> = pages
        .iter()
        .map(|(url, v)| (url.as_str(), check_schema_health(v).score))
        .collect();
    // Stable sort keeps input order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    SchemaComparison {
        average_schema_count: total_schemas as f64 / count,
        average_valid_schemas: total_valid as f64 / count,
        average_error_count: total_errors as f64 / count,
        common_schema_types,
        best_implementation: scored.first().map(|(u, _)| u.to_string()).unwrap_or_default(),
        worst_implementation: scored.last().map(|(u, _)| u.to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validator::validate_blocks;

    #[test]
    fn test_no_schemas_scores_fifty() {
        let health = check_schema_health(&SchemaValidationSummary::default());
        assert_eq!(health.score, 50);
        assert_eq!(health.status, HealthStatus::Warning);
        assert_eq!(health.issues, vec!["No structured data found on page"]);
        // No Article suggestion without any schema at all
        assert!(!health
            .recommendations
            .iter()
            .any(|r| r.contains("Article schema")));
    }

    #[test]
    fn test_clean_page_is_healthy() {
        let summary = validate_blocks(&[
            r#"{"@context":"https://schema.org","@type":"Organization","name":"Acme","logo":"l","url":"u","sameAs":["s"]}"#,
            r#"{"@context":"https://schema.org","@type":"BreadcrumbList","itemListElement":[{}]}"#,
        ]);
        let health = check_schema_health(&summary);
        assert_eq!(health.score, 100);
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.issues.is_empty());
        assert_eq!(
            health.recommendations,
            vec!["Consider adding Article schema for better content representation"]
        );
    }

    #[test]
    fn test_all_invalid_with_errors() {
        // One invalid object with 3 errors and 4 warnings: 100 - 30 - 20 - 8
        let summary = validate_blocks(&[r#"{"@type":"Article"}"#]);
        assert_eq!(summary.total_errors, 3);
        assert_eq!(summary.total_warnings, 4);
        let health = check_schema_health(&summary);
        assert_eq!(health.score, 42);
        assert_eq!(health.status, HealthStatus::Critical);
    }

    #[test]
    fn test_compare_picks_best_and_worst() {
        let good = validate_blocks(&[
            r#"{"@context":"https://schema.org","@type":"WebPage","name":"a"}"#,
        ]);
        let bad = validate_blocks(&[r#"{"@type":"WebPage"}"#]);
        let none = SchemaValidationSummary::default();
        let comparison = compare_schemas(&[
            ("https://bad.example".to_string(), bad),
            ("https://good.example".to_string(), good),
            ("https://none.example".to_string(), none),
        ]);
        assert_eq!(comparison.best_implementation, "https://good.example");
        // bad scores 48, below the empty page at 50
        assert_eq!(comparison.worst_implementation, "https://bad.example");
        assert_eq!(comparison.common_schema_types, vec!["WebPage"]);
        assert!((comparison.average_schema_count - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_empty() {
        assert_eq!(compare_schemas(&[]), SchemaComparison::default());
    }
}
