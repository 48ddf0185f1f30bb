//! Structured data (schema.org JSON-LD) validation and health scoring

pub mod health;
pub mod validator;

pub use health::{check_schema_health, compare_schemas, HealthStatus, SchemaComparison, SchemaHealthCheck};
pub use validator::{
    format_validation_summary, validate_page_schemas, validate_schema, IssueSeverity,
    SchemaIssue, SchemaValidationResult, SchemaValidationSummary,
};
