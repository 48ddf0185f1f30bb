//! # RankScope Common Library
//!
//! Shared code for the RankScope services:
//! - Error and result types
//! - Analysis lifecycle events and the broadcast event bus
//! - SSE helpers
//! - Bootstrap configuration loading
//! - Clock abstraction and content hashing for cache keys

pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
