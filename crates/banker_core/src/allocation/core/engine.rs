//! Allocation engine implementing the Banker's algorithm.
//!
//! The engine owns four tables, all indexed by customer then resource type:
//!
//! - **available**: units of each resource type not held by anyone
//! - **maximum**: the lifetime claim of each customer, fixed at construction
//! - **allocation**: units currently held by each customer
//! - **need**: the remaining claim, `maximum - allocation`, never written directly
//!
//! Requests follow a tentative-allocate, check, commit-or-rollback protocol:
//! the units are moved, the [`Reachability`] search runs on the resulting
//! state, and the exact same units are moved back when some customer could no
//! longer finish. Releases and preemptions only grow the free pool, so they
//! never need a safety check.
//!
//! After every completed operation the following holds for every customer `c`
//! and resource `r`:
//!
//! - `allocation[c][r] + need[c][r] == maximum[c][r]`
//! - `available[r] + sum_c allocation[c][r] == total_units[r]`

use tracing::{debug, info, warn};

use crate::allocation::{
    Units,
    core::{
        reachability::Reachability,
        victim::{AscendingIndex, VictimPolicy},
    },
    error::{AllocationError, QuantityLimit},
};

/// Read-only copy of the allocation tables, used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub available: Vec<Units>,
    pub maximum: Vec<Vec<Units>>,
    pub allocation: Vec<Vec<Units>>,
    pub need: Vec<Vec<Units>>,
}

/// Outcome of a deadlock resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No deadlock remains. Lists the customers preempted on the way, in order.
    Resolved { preempted: Vec<usize> },
    /// Every candidate was preempted and some customer still cannot finish.
    Unresolved { preempted: Vec<usize> },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn preempted(&self) -> &[usize] {
        match self {
            Resolution::Resolved { preempted } | Resolution::Unresolved { preempted } => preempted,
        }
    }
}

/// Banker's algorithm state for a fixed set of customers and resource types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEngine {
    total_units: Vec<Units>,
    available: Vec<Units>,
    maximum: Vec<Vec<Units>>,
    allocation: Vec<Vec<Units>>,
    need: Vec<Vec<Units>>,
}

impl AllocationEngine {
    /// Build an engine from the total units of each resource type and the
    /// per-customer maximum claims and initial allocations.
    ///
    /// The free pool is derived as `total_units - sum of allocations`.
    ///
    /// # Errors
    /// [`AllocationError::InvalidConfiguration`] when there are no resource
    /// types or no customers, when a row does not have one entry per resource
    /// type, when a customer holds more than its maximum claim, or when the
    /// initial allocations of a resource type exceed its total.
    pub fn new(
        total_units: Vec<Units>,
        maximum: Vec<Vec<Units>>,
        allocation: Vec<Vec<Units>>,
    ) -> Result<Self, AllocationError> {
        let resources = total_units.len();
        if resources == 0 {
            return Err(AllocationError::InvalidConfiguration(
                "at least one resource type is required".to_string(),
            ));
        }
        if maximum.is_empty() {
            return Err(AllocationError::InvalidConfiguration(
                "at least one customer is required".to_string(),
            ));
        }
        if maximum.len() != allocation.len() {
            return Err(AllocationError::InvalidConfiguration(format!(
                "{} maximum rows but {} allocation rows",
                maximum.len(),
                allocation.len()
            )));
        }

        let mut available = total_units.clone();
        let mut need = Vec::with_capacity(maximum.len());
        for (customer, (max_row, held_row)) in maximum.iter().zip(&allocation).enumerate() {
            if max_row.len() != resources || held_row.len() != resources {
                return Err(AllocationError::InvalidConfiguration(format!(
                    "customer {customer} must have {resources} entries per row (maximum: {}, allocation: {})",
                    max_row.len(),
                    held_row.len()
                )));
            }
            let mut need_row = Vec::with_capacity(resources);
            for (resource, (&max, &held)) in max_row.iter().zip(held_row).enumerate() {
                need_row.push(max.checked_sub(held).ok_or_else(|| {
                    AllocationError::InvalidConfiguration(format!(
                        "customer {customer} holds {held} units of resource {resource} but claims at most {max}"
                    ))
                })?);
                available[resource] = available[resource].checked_sub(held).ok_or_else(|| {
                    AllocationError::InvalidConfiguration(format!(
                        "initial allocations of resource {resource} exceed its {} total units",
                        total_units[resource]
                    ))
                })?;
            }
            need.push(need_row);
        }

        let engine = Self { total_units, available, maximum, allocation, need };
        info!(
            "[init] Engine ready: customers: {}, resources: {}, available: {:?}",
            engine.customers(),
            engine.resources(),
            engine.available
        );
        Ok(engine)
    }

    pub fn customers(&self) -> usize {
        self.maximum.len()
    }

    pub fn resources(&self) -> usize {
        self.total_units.len()
    }

    pub fn total_units(&self) -> &[Units] {
        &self.total_units
    }

    pub fn available(&self) -> &[Units] {
        &self.available
    }

    pub fn maximum(&self, customer: usize) -> Option<&[Units]> {
        self.maximum.get(customer).map(Vec::as_slice)
    }

    pub fn allocation(&self, customer: usize) -> Option<&[Units]> {
        self.allocation.get(customer).map(Vec::as_slice)
    }

    pub fn need(&self, customer: usize) -> Option<&[Units]> {
        self.need.get(customer).map(Vec::as_slice)
    }

    /// Copy of every table.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            available: self.available.clone(),
            maximum: self.maximum.clone(),
            allocation: self.allocation.clone(),
            need: self.need.clone(),
        }
    }

    /// Run the reachability search on the committed state.
    pub fn reachability(&self) -> Reachability {
        Reachability::evaluate(self.available.clone(), &self.allocation, &self.need)
    }

    /// Whether some order lets every customer obtain its full remaining need.
    pub fn is_safe(&self) -> bool {
        self.reachability().is_complete()
    }

    /// A completion order proving the state safe, if there is one.
    pub fn safe_sequence(&self) -> Option<Vec<usize>> {
        let reach = self.reachability();
        reach.is_complete().then(|| reach.into_order())
    }

    /// Whether at least one customer can never complete given current holdings.
    pub fn detect_deadlock(&self) -> bool {
        !self.reachability().is_complete()
    }

    /// Customers that can never complete given current holdings.
    pub fn deadlocked_customers(&self) -> Vec<usize> {
        self.reachability().unfinished()
    }

    /// Grant `units` to `customer` if doing so keeps the system safe.
    ///
    /// Checks, in order: the customer index, the length of `units`, that no
    /// entry exceeds the customer's need, and that no entry exceeds the free
    /// pool. The units are then moved tentatively and moved back if the
    /// resulting state is unsafe, leaving every table exactly as it was.
    pub fn request(&mut self, customer: usize, units: &[Units]) -> Result<(), AllocationError> {
        self.validate_customer(customer)?;
        self.validate_dimension(units)?;
        for (resource, (&requested, &need)) in units.iter().zip(&self.need[customer]).enumerate() {
            if requested > need {
                warn!(
                    "[request] Denied: customer: {}, resource: {}, requested: {} > need: {}",
                    customer, resource, requested, need
                );
                return Err(AllocationError::InvalidQuantity {
                    customer,
                    resource,
                    requested,
                    limit: need,
                    kind: QuantityLimit::Need,
                });
            }
        }
        for (resource, (&requested, &available)) in units.iter().zip(&self.available).enumerate() {
            if requested > available {
                warn!(
                    "[request] Denied: customer: {}, resource: {}, requested: {} > available: {}",
                    customer, resource, requested, available
                );
                return Err(AllocationError::InvalidQuantity {
                    customer,
                    resource,
                    requested,
                    limit: available,
                    kind: QuantityLimit::Available,
                });
            }
        }

        self.move_to_customer(customer, units);
        debug!("[request] Tentative grant: customer: {}, units: {:?}", customer, units);

        if self.is_safe() {
            info!("[request] Granted: customer: {}, units: {:?}", customer, units);
            debug_assert_eq!(self.check_invariants(), Ok(()));
            Ok(())
        } else {
            self.move_to_pool(customer, units);
            warn!("[request] Denied, rolled back unsafe grant: customer: {}, units: {:?}", customer, units);
            debug_assert_eq!(self.check_invariants(), Ok(()));
            Err(AllocationError::UnsafeState { customer })
        }
    }

    /// Return `units` held by `customer` to the free pool.
    ///
    /// The whole release is rejected if any entry exceeds what the customer
    /// holds; nothing is moved in that case.
    pub fn release(&mut self, customer: usize, units: &[Units]) -> Result<(), AllocationError> {
        self.validate_customer(customer)?;
        self.validate_dimension(units)?;
        for (resource, (&released, &held)) in
            units.iter().zip(&self.allocation[customer]).enumerate()
        {
            if released > held {
                warn!(
                    "[release] Denied: customer: {}, resource: {}, released: {} > held: {}",
                    customer, resource, released, held
                );
                return Err(AllocationError::InvalidQuantity {
                    customer,
                    resource,
                    requested: released,
                    limit: held,
                    kind: QuantityLimit::Allocation,
                });
            }
        }

        self.move_to_pool(customer, units);
        info!("[release] Released: customer: {}, units: {:?}", customer, units);
        debug_assert_eq!(self.check_invariants(), Ok(()));
        Ok(())
    }

    /// Reclaim everything `customer` holds, leaving its maximum claim untouched.
    ///
    /// Returns the reclaimed units.
    pub fn preempt(&mut self, customer: usize) -> Result<Vec<Units>, AllocationError> {
        self.validate_customer(customer)?;
        let held = self.allocation[customer].clone();
        self.move_to_pool(customer, &held);
        debug!("[preempt] Reclaimed: customer: {}, units: {:?}", customer, held);
        debug_assert_eq!(self.check_invariants(), Ok(()));
        Ok(held)
    }

    /// Break a deadlock by preempting customers in ascending index order.
    pub fn resolve_deadlock(&mut self) -> Resolution {
        self.resolve_deadlock_with(&AscendingIndex)
    }

    /// Break a deadlock by preempting the candidates chosen by `policy`.
    ///
    /// Before each preemption the deadlock is checked again and the loop stops
    /// as soon as every customer can finish. Once the candidates are exhausted
    /// a final check decides between resolved and unresolved.
    pub fn resolve_deadlock_with(&mut self, policy: &dyn VictimPolicy) -> Resolution {
        let mut preempted = Vec::new();
        for customer in policy.candidates(self) {
            if !self.detect_deadlock() {
                info!("[resolve] Deadlock resolved: preempted: {:?}", preempted);
                return Resolution::Resolved { preempted };
            }
            match self.preempt(customer) {
                Ok(_) => preempted.push(customer),
                Err(e) => warn!("[resolve] Skipping victim {}: {}", customer, e),
            }
        }

        if self.detect_deadlock() {
            warn!("[resolve] Failed to resolve deadlock: preempted: {:?}", preempted);
            Resolution::Unresolved { preempted }
        } else {
            info!("[resolve] Deadlock resolved: preempted: {:?}", preempted);
            Resolution::Resolved { preempted }
        }
    }

    /// Verify the conservation invariants of the tables.
    pub fn check_invariants(&self) -> Result<(), AllocationError> {
        for customer in 0..self.customers() {
            for resource in 0..self.resources() {
                let max = self.maximum[customer][resource];
                let held = self.allocation[customer][resource];
                let need = self.need[customer][resource];
                if held > max || u64::from(held) + u64::from(need) != u64::from(max) {
                    return Err(AllocationError::InvalidConfiguration(format!(
                        "claim not conserved for customer {customer}, resource {resource} (maximum: {max}, allocation: {held}, need: {need})"
                    )));
                }
            }
        }
        for (resource, &total) in self.total_units.iter().enumerate() {
            let held: u64 = self.allocation.iter().map(|row| u64::from(row[resource])).sum();
            let available = self.available[resource];
            if u64::from(available) + held != u64::from(total) {
                return Err(AllocationError::InvalidConfiguration(format!(
                    "units not conserved for resource {resource} (available: {available}, allocated: {held}, total: {total})"
                )));
            }
        }
        Ok(())
    }

    fn validate_customer(&self, customer: usize) -> Result<(), AllocationError> {
        if customer < self.customers() {
            Ok(())
        } else {
            warn!("[validate] Invalid customer: {}", customer);
            Err(AllocationError::InvalidCustomer { customer, customers: self.customers() })
        }
    }

    fn validate_dimension(&self, units: &[Units]) -> Result<(), AllocationError> {
        if units.len() == self.resources() {
            Ok(())
        } else {
            warn!("[validate] Expected {} resource types, got {}", self.resources(), units.len());
            Err(AllocationError::DimensionMismatch { expected: self.resources(), got: units.len() })
        }
    }

    /// Caller guarantees `units <= available` and `units <= need[customer]`.
    fn move_to_customer(&mut self, customer: usize, units: &[Units]) {
        for (resource, &n) in units.iter().enumerate() {
            self.available[resource] -= n;
            self.allocation[customer][resource] += n;
            self.need[customer][resource] -= n;
        }
    }

    /// Caller guarantees `units <= allocation[customer]`.
    fn move_to_pool(&mut self, customer: usize, units: &[Units]) {
        for (resource, &n) in units.iter().enumerate() {
            self.allocation[customer][resource] -= n;
            self.available[resource] += n;
            self.need[customer][resource] += n;
        }
    }
}
