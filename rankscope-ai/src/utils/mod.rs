//! Utility modules for rankscope-ai

pub mod backoff;
pub mod json_extract;
pub mod rate_limiter;

pub use backoff::{backoff_delay, retry_with_backoff, RetryPolicy};
pub use json_extract::{extract_json, is_present, missing_fields, JsonExtractError};
pub use rate_limiter::RateLimiter;
