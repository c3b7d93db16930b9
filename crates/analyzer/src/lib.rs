//! # Product Profitability Analyzer
//!
//! Reads revenue (600) and returns (610) entries over a window, groups them
//! by variant attribution, and classifies each product as healthy, warning
//! or toxic. Entries without a `variant_id` cannot be attributed and are
//! dropped from per-product output, never errored.

pub mod engine;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use engine::{aggregate, classify, top_and_bottom, ProductAnalyzer, TopAndBottom};
pub use error::AnalyzerError;
