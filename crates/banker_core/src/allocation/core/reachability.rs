//! Fixed-point search over the customer/resource "who can finish" relation.
//!
//! Starting from a work vector (the free units), a customer whose remaining
//! need fits in the work vector is assumed to run to completion and give its
//! allocation back, which grows the work vector. The search repeats until a
//! full pass over the customers makes no progress. Both the work vector and
//! the set of finished customers only grow, so at most one pass per customer
//! is needed.
//!
//! The same search answers two questions: a state is *safe* when every
//! customer finishes, and the committed state is *deadlocked* when some
//! customer does not.

use crate::allocation::Units;

/// Outcome of the reachability search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    order: Vec<usize>,
    finished: Vec<bool>,
}

impl Reachability {
    /// Run the search from `work` over the given allocation and need tables.
    ///
    /// Customers are visited in ascending index order inside each pass, so
    /// the recorded completion order is deterministic.
    pub fn evaluate(mut work: Vec<Units>, allocation: &[Vec<Units>], need: &[Vec<Units>]) -> Self {
        let mut finished = vec![false; need.len()];
        let mut order = Vec::with_capacity(need.len());

        loop {
            let mut progress = false;
            for (customer, customer_need) in need.iter().enumerate() {
                if finished[customer] || !fits(customer_need, &work) {
                    continue;
                }
                for (w, held) in work.iter_mut().zip(&allocation[customer]) {
                    *w += held;
                }
                finished[customer] = true;
                order.push(customer);
                progress = true;
            }
            if !progress {
                break;
            }
        }

        Self { order, finished }
    }

    /// Whether every customer can run to completion.
    pub fn is_complete(&self) -> bool {
        self.finished.iter().all(|&f| f)
    }

    /// Customers in the order they were found able to finish.
    ///
    /// When [`is_complete`](Self::is_complete) holds this is a safe sequence.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Customers that can never finish, in ascending order.
    pub fn unfinished(&self) -> Vec<usize> {
        self.finished
            .iter()
            .enumerate()
            .filter_map(|(customer, &f)| (!f).then_some(customer))
            .collect()
    }

    pub fn into_order(self) -> Vec<usize> {
        self.order
    }
}

/// Componentwise `need <= work`.
fn fits(need: &[Units], work: &[Units]) -> bool {
    need.iter().zip(work).all(|(n, w)| n <= w)
}
