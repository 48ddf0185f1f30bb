//! Report rendering

pub mod markdown;

pub use markdown::render_report;
