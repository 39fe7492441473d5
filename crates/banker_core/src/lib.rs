//! Resource allocation tracker with deadlock avoidance and recovery.
//!
//! This crate keeps, for a fixed set of customers and resource types, the
//! classic Banker's algorithm tables (available, maximum, allocation, need)
//! and exposes the operations that move units between them while keeping
//! the system out of unsafe states:
//!
//! - **Avoidance**: requests are tentatively applied, checked against the
//!   safety predicate and rolled back when they would lead to an unsafe state.
//! - **Detection**: the same reachability search tells whether the committed
//!   state leaves some customer unable to ever complete.
//! - **Recovery**: a deadlock is broken by preempting customers' holdings
//!   following a [`VictimPolicy`](allocation::core::victim::VictimPolicy).
//!
//! The engine itself is a plain state machine driven through `&mut self`.
//! [`AllocationApiService`](allocation::api::service::AllocationApiService)
//! wraps it as a [`tower`] service so that concurrent callers each run a
//! whole operation inside a single critical section.
//!
//! [`tower`]: https://docs.rs/tower

#[cfg(test)]
pub mod tests;

pub mod allocation;

pub mod banker_tracing {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize tracing for tests
    /// This sets up a tracing subscriber that will display logs during test execution.
    /// Call this at the beginning of tests that need to see tracing output.
    pub fn init() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("off"))
                .unwrap_or_default();

            let _ = fmt().with_target(false).with_test_writer().with_env_filter(filter).try_init();
        });
    }
}
