//! # Profitlens Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database. It is the system's "permanent archive."
//!
//! ## Architectural Principles
//!
//! - **Adapter layer:** This crate encapsulates all database-specific logic.
//!   It provides a clean, abstract API to the rest of the application, hiding
//!   the underlying SQL and database implementation details.
//! - **Storage-level invariants:** The uniqueness of `(merchant_id, event_id)`
//!   on the transactions table is a database constraint, not an application
//!   check, so concurrent postings of the same event can never both commit.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses a
//!   connection pool (`PgPool`) for high-performance, concurrent database access.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations, ensuring the schema is up-to-date.
//! - `LedgerRepository`: The main struct that holds the connection pool and provides all
//!   the high-level data access methods (e.g., `insert_transaction`).
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{
    LedgerAggregates, LedgerRepository, ProductEntryRow, ResolvedEntry, TransactionInsert,
};
