//! # Pain/Health Scoring Engine
//!
//! Condenses a merchant's trailing-30-day ledger activity into a single
//! 0-100 risk score built from five independent, individually capped
//! factors, plus an estimated daily "opportunity loss" for each triggered
//! factor. The result is an idempotent snapshot: every diagnosis overwrites
//! the previous one and refreshes the de-duplicated issue log.

pub mod engine;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use engine::{level_for, score, PainScorer, ScoringInputs, ToxicProduct};
pub use error::ScoringError;
