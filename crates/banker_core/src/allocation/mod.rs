//! Allocation module.
//!
//! This module tracks how the units of every resource type are split between
//! the free pool and the customers, and guards every transition with the
//! Banker's safety predicate.
//!
//! ## Core Architecture
//!
//! ### Engine
//! [`core::engine::AllocationEngine`] owns the four tables and implements
//! request, release, safety evaluation, deadlock detection and deadlock
//! resolution. Every operation leaves the tables consistent before returning.
//!
//! ### Reachability
//! [`core::reachability::Reachability`] is the single fixed-point search
//! shared by the safety check, the post-request check and deadlock detection.
//!
//! ### Victim Selection
//! [`core::victim`] decides in which order customers are preempted when a
//! deadlock has to be broken.
//!
//! ### API
//! [`api`] defines the request/response vocabulary and a `tower` service that
//! serializes callers on one shared engine.
//!
//! ## Initialization Helpers
//!
//! - `init_allocator()`: validate an initial configuration and wrap it in the
//!   default service with ascending-index victim selection.
pub mod api;
pub mod core;
pub mod error;

/// Units of a single resource type.
pub type Units = u32;

/// Initialize an allocation service from an initial configuration.
///
/// # Arguments
/// * `total_units` - Units of each resource type that exist in the system
/// * `maximum` - Maximum claim of each customer, one row per customer
/// * `allocation` - Units initially held by each customer, one row per customer
///
/// # Errors
/// Returns [`error::AllocationError::InvalidConfiguration`] when the tables are
/// inconsistent (see [`core::engine::AllocationEngine::new`]).
pub fn init_allocator(
    total_units: Vec<Units>,
    maximum: Vec<Vec<Units>>,
    allocation: Vec<Vec<Units>>,
) -> Result<api::service::AllocationApiService, error::AllocationError> {
    let engine = core::engine::AllocationEngine::new(total_units, maximum, allocation)?;
    Ok(api::service::AllocationApiService::new(engine))
}
