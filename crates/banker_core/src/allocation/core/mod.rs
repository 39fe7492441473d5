//! Core components of the allocation engine.
//!
//! - **Reachability**: the fixed-point "who can finish" search
//! - **Engine**: the allocation tables and the operations that mutate them
//! - **Victim**: preemption order used to break deadlocks

pub mod engine;
pub mod reachability;
pub mod victim;
