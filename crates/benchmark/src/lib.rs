//! # Benchmark Engine
//!
//! Reduces each merchant's day to one summary row, groups merchants into
//! revenue-size cohorts, and publishes population percentiles per cohort and
//! metric. A cohort only publishes once at least three merchants contribute
//! on a given day; below that privacy floor the cohort is silently skipped
//! and ranking queries degrade to "percentile unknown".

pub mod engine;
pub mod error;
pub mod percentile;

// Re-export the core types to provide a clean public API.
pub use engine::{cohort_for, compute_cohort_rows, rank_for, BenchmarkEngine};
pub use error::BenchmarkError;
pub use percentile::{percentiles, Percentiles};
