//! Cross-module tests for the combat arena.
//!
//! # Test Structure
//!
//! - `determinism.rs`: same seed and same roster give the same outcome
//! - `integration.rs`: factory, storage, sweep and scheduler working together
//! - `helpers.rs`: roster builders, configurations and recording observers

mod helpers;

// Re-export for convenience
pub use helpers::*;
