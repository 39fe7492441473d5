//! Victim selection for deadlock resolution.
//!
//! The resolver walks the candidates returned by a [`VictimPolicy`] and
//! preempts them one at a time until the deadlock is gone.

use std::fmt::Debug;

use crate::allocation::core::engine::AllocationEngine;

/// Chooses which customers the resolver may preempt, and in which order.
pub trait VictimPolicy: Debug + Send + Sync {
    fn candidates(&self, engine: &AllocationEngine) -> Vec<usize>;
}

/// Every customer, in ascending index order, whether or not it takes part in
/// the deadlock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AscendingIndex;

impl VictimPolicy for AscendingIndex {
    fn candidates(&self, engine: &AllocationEngine) -> Vec<usize> {
        (0..engine.customers()).collect()
    }
}

/// Only the customers that can never finish in the current state, in
/// ascending index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlockedOnly;

impl VictimPolicy for DeadlockedOnly {
    fn candidates(&self, engine: &AllocationEngine) -> Vec<usize> {
        engine.deadlocked_customers()
    }
}
