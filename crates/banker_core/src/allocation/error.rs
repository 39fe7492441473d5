use std::fmt;

use thiserror::Error;

use crate::allocation::Units;

/// Which bound a quantity was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityLimit {
    /// Remaining claim of the customer.
    Need,
    /// Units currently in the free pool.
    Available,
    /// Units currently held by the customer.
    Allocation,
}

impl fmt::Display for QuantityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityLimit::Need => write!(f, "need"),
            QuantityLimit::Available => write!(f, "available"),
            QuantityLimit::Allocation => write!(f, "allocation"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Allocation error, invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Allocation error, invalid customer (customer: {customer}, customers: {customers})")]
    InvalidCustomer { customer: usize, customers: usize },

    #[error(
        "Allocation error, invalid quantity (customer: {customer}, resource: {resource}, requested: {requested}, {kind}: {limit})"
    )]
    InvalidQuantity {
        customer: usize,
        resource: usize,
        requested: Units,
        limit: Units,
        kind: QuantityLimit,
    },

    #[error("Allocation error, invalid quantity (expected {expected} resource types, got {got})")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Allocation error, request would enter an unsafe state (customer: {customer})")]
    UnsafeState { customer: usize },

    #[error("Allocation error, internal engine error")]
    InternalError,
}

impl AllocationError {
    /// Whether this error reports a quantity outside its permitted bounds.
    pub fn is_invalid_quantity(&self) -> bool {
        matches!(
            self,
            AllocationError::InvalidQuantity { .. } | AllocationError::DimensionMismatch { .. }
        )
    }
}
