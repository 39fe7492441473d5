//! Allocation API type definitions.
//!
//! Every operation of the engine has a request variant. Denials are not
//! responses: they come back as the service error,
//! [`AllocationError`](crate::allocation::error::AllocationError), carrying
//! the reason.

pub use crate::allocation::core::engine::{Resolution, Snapshot};
use crate::allocation::Units;

/// Operations a caller can run against the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationRequest {
    /// Ask for more units on behalf of a customer.
    ///
    /// Granted only if the units fit in the customer's remaining need and in
    /// the free pool, and the resulting state is safe.
    Request {
        /// Customer index
        customer: usize,
        /// Units of each resource type, one entry per resource type
        units: Vec<Units>,
    },

    /// Give units held by a customer back to the free pool.
    Release {
        /// Customer index
        customer: usize,
        /// Units of each resource type, one entry per resource type
        units: Vec<Units>,
    },

    /// Evaluate whether the committed state is safe.
    CheckSafety,

    /// Evaluate whether some customer can never complete.
    DetectDeadlock,

    /// Preempt customers until no deadlock remains or candidates run out.
    ResolveDeadlock,

    /// Read-only copy of the allocation tables.
    Snapshot,
}

/// Responses of the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationResponse {
    /// The request was granted and committed.
    Granted,

    /// The release was applied.
    Released,

    /// Safety of the committed state.
    Safety {
        safe: bool,
        /// Completion order found by the search. A full safe sequence when
        /// `safe`, otherwise the customers that could still finish.
        sequence: Vec<usize>,
    },

    /// Customers that can never complete. Empty when there is no deadlock.
    Deadlock { deadlocked: Vec<usize> },

    /// Outcome of a resolution attempt.
    Resolution(Resolution),

    /// Copy of the allocation tables.
    Snapshot(Snapshot),
}
