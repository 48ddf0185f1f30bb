//! HTTP API handlers for rankscope-ai
//!
//! - `POST /analyze`: run an analysis (JSON or SSE response)
//! - `GET /analyze/events`: lifecycle events of every analysis
//! - `GET /health`: status and configured integrations

pub mod analyze;
pub mod health;

pub use analyze::{analysis_event_stream, analyze_routes};
pub use health::health_routes;
