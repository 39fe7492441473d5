//! Allocation API service implementation.
//!
//! [`AllocationApiService`] shares one [`AllocationEngine`] between all its
//! clones. The request handler moves units tentatively before checking
//! safety, so nobody may observe the tables in between: each call locks the
//! engine once and runs the whole operation (validation, tentative move,
//! safety search, commit or rollback) before unlocking.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::Poll,
};

use tower::Service;
use tracing::{debug, info};

use crate::allocation::{
    api::types::{AllocationRequest, AllocationResponse},
    core::{
        engine::AllocationEngine,
        victim::{AscendingIndex, VictimPolicy},
    },
    error::AllocationError,
};

/// Allocation API Service
///
/// Clones share the same engine and victim policy.
#[derive(Debug, Clone)]
pub struct AllocationApiService {
    engine: Arc<Mutex<AllocationEngine>>,
    policy: Arc<dyn VictimPolicy>,
}

impl AllocationApiService {
    /// Wraps an engine, resolving deadlocks in ascending index order.
    pub fn new(engine: AllocationEngine) -> Self {
        Self { engine: Arc::new(Mutex::new(engine)), policy: Arc::new(AscendingIndex) }
    }

    /// Use another victim selection policy for deadlock resolution.
    pub fn with_victim_policy<V: VictimPolicy + 'static>(self, policy: V) -> Self {
        Self { policy: Arc::new(policy), ..self }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut AllocationEngine) -> T,
    ) -> Result<T, AllocationError> {
        let mut engine = self.engine.lock().map_err(|_| AllocationError::InternalError)?;
        Ok(f(&mut engine))
    }

    fn dispatch(
        &self,
        request: AllocationRequest,
    ) -> Result<AllocationResponse, AllocationError> {
        let policy = self.policy.clone();
        self.with_engine(|engine| match request {
            AllocationRequest::Request { customer, units } => {
                debug!("[api] Request: customer: {}, units: {:?}", customer, units);
                engine.request(customer, &units).map(|_| AllocationResponse::Granted)
            }
            AllocationRequest::Release { customer, units } => {
                debug!("[api] Release: customer: {}, units: {:?}", customer, units);
                engine.release(customer, &units).map(|_| AllocationResponse::Released)
            }
            AllocationRequest::CheckSafety => {
                let reach = engine.reachability();
                debug!("[api] CheckSafety: safe: {}", reach.is_complete());
                Ok(AllocationResponse::Safety {
                    safe: reach.is_complete(),
                    sequence: reach.into_order(),
                })
            }
            AllocationRequest::DetectDeadlock => {
                let deadlocked = engine.deadlocked_customers();
                debug!("[api] DetectDeadlock: deadlocked: {:?}", deadlocked);
                Ok(AllocationResponse::Deadlock { deadlocked })
            }
            AllocationRequest::ResolveDeadlock => {
                info!("[api] ResolveDeadlock: policy: {:?}", policy);
                Ok(AllocationResponse::Resolution(engine.resolve_deadlock_with(policy.as_ref())))
            }
            AllocationRequest::Snapshot => Ok(AllocationResponse::Snapshot(engine.snapshot())),
        })?
    }
}

impl Service<AllocationRequest> for AllocationApiService {
    type Response = AllocationResponse;
    type Error = AllocationError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: AllocationRequest) -> Self::Future {
        let result = self.dispatch(request);
        Box::pin(async move { result })
    }
}
