//! External-facing API of the allocation engine.
//!
//! - [`types`]: request and response vocabulary
//! - [`service`]: a `tower` service running each request atomically on a
//!   shared engine

pub mod service;
pub mod types;

// Re-export all types for convenience
pub use types::*;
