//! # Commerce Event Types
//!
//! The inbound boundary of the ledger core. An external connector (the
//! storefront poller) hands the system `EventEnvelope`s; this crate defines
//! that envelope plus the typed payloads the posting engine understands.
//!
//! Envelopes carry their payload as raw JSON so that malformed upstream data
//! can be stored and dead-lettered without being parseable; the posting
//! engine calls [`EventEnvelope::typed_payload`] to validate lazily.

pub mod error;
pub mod types;

// Re-export the core types to provide a clean public API.
pub use error::EventError;
pub use types::{
    AdSpendPayload, EventEnvelope, EventPayload, EventType, FeeChargedPayload, FeeKind, LineItem,
    OrderCreatedPayload, OrderReturnedPayload, ReturnLine,
};
