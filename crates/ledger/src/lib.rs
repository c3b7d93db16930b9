//! # Ledger Posting Engine
//!
//! Converts raw commerce events into balanced double-entry postings. This is
//! the only component that writes to the ledger; everything downstream (the
//! analyzers, scoring, benchmarking) reads what it produces.
//!
//! ## Guarantees
//!
//! - **Balance:** every transaction's debits equal its credits, verified
//!   before commit. An imbalance after mapping is a mapping-rule bug and is
//!   rejected loudly, never partially committed.
//! - **Idempotency:** the same `event_id` never posts twice. The unique
//!   `(merchant_id, event_id)` index in storage settles concurrent races;
//!   a duplicate is a no-op that returns the existing transaction.
//! - **Atomicity:** all entries of a transaction are written in one SQL
//!   transaction or not at all, so a failed posting is retryable without
//!   side effects.

pub mod chart;
pub mod error;
pub mod mapping;
pub mod poster;

// Re-export the core types to provide a clean public API.
pub use chart::{standard_chart, AccountDef};
pub use error::LedgerError;
pub use mapping::{check_balanced, map_event, MappedTransaction};
pub use poster::{AccountRegistry, LedgerPoster, PostOutcome};
