//! # What-If Simulation Engine
//!
//! A pure function over a snapshot of analyzer output and global ledger
//! allocations. Answers hypothetical questions (raise prices 10%, cut ad
//! budget, kill a product) without touching the ledger: no reads, no writes,
//! no side effects, trivially parallelizable across scenarios.

pub mod engine;
pub mod error;
pub mod model;

// Re-export the core types to provide a clean public API.
pub use engine::simulate;
pub use error::SimulationError;
pub use model::{
    GlobalAllocations, ProductBaseline, Scenario, SimulationInput, SimulationResult,
    SimulationScope, REST_OF_STORE,
};
