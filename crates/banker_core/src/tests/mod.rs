#[macro_use]
mod fixtures;
mod properties;

use fixtures::Scenario;
use tower::Service;

use crate::allocation::{
    api::{AllocationRequest, AllocationResponse, Resolution},
    error::{AllocationError, QuantityLimit},
};

fn init_tracing() {
    crate::banker_tracing::init();
}

#[tokio::test]
async fn integration_classic_initial_state_is_safe() {
    init_tracing();
    let scenario = Scenario::classic();
    let mut service = scenario.service();

    let snapshot = snapshot!(service);
    assert_eq!(snapshot.available, vec![2, 1, 1, 2]);
    assert_eq!(snapshot.need[1], vec![5, 3, 5, 2]);
    assert_safety!(service, true, [0, 2, 3, 4, 1]);
    assert_eq!(scenario.engine().safe_sequence(), Some(vec![0, 2, 3, 4, 1]));
}

#[tokio::test]
async fn integration_classic_request_above_need_denied() {
    init_tracing();
    let mut service = Scenario::classic().service();
    let before = snapshot!(service);

    deny!(
        service,
        0,
        [2, 0, 0, 0],
        AllocationError::InvalidQuantity {
            customer: 0,
            resource: 0,
            requested: 2,
            limit: 1,
            kind: QuantityLimit::Need,
        }
    );
    assert_eq!(snapshot!(service), before);
}

#[tokio::test]
async fn integration_classic_request_above_available_denied() {
    init_tracing();
    let mut service = Scenario::classic().service();
    let before = snapshot!(service);

    deny!(
        service,
        1,
        [3, 0, 0, 0],
        AllocationError::InvalidQuantity { resource: 0, kind: QuantityLimit::Available, .. }
    );
    deny!(service, 5, [0, 0, 0, 0], AllocationError::InvalidCustomer { customer: 5, customers: 5 });
    deny!(service, 1, [1, 0, 0], AllocationError::DimensionMismatch { expected: 4, got: 3 });
    assert_eq!(snapshot!(service), before);
}

#[tokio::test]
async fn integration_classic_unsafe_request_rolled_back() {
    init_tracing();
    let mut service = Scenario::classic().service();
    let before = snapshot!(service);

    // Within need and availability, but leaves customers 1 to 4 unable to finish.
    deny!(service, 4, [0, 1, 0, 0], AllocationError::UnsafeState { customer: 4 });
    assert_eq!(snapshot!(service), before);
    assert_safety!(service, true, [0, 2, 3, 4, 1]);
}

#[tokio::test]
async fn integration_classic_grant_then_release() {
    init_tracing();
    let mut service = Scenario::classic().service();

    grant!(service, 0, [1, 0, 1, 1]);
    let snapshot = snapshot!(service);
    assert_eq!(snapshot.available, vec![1, 1, 0, 1]);
    assert_eq!(snapshot.allocation[0], vec![4, 1, 5, 2]);
    assert_eq!(snapshot.need[0], vec![0, 0, 0, 0]);
    assert_safety!(service, true, [0, 2, 3, 4, 1]);

    release!(service, 0, [4, 1, 5, 2]);
    let snapshot = snapshot!(service);
    assert_eq!(snapshot.available, vec![5, 2, 5, 3]);
    assert_eq!(snapshot.need[0], vec![4, 1, 5, 2]);

    // Customer 2 can now take all but one unit of its remaining claim.
    grant!(service, 2, [3, 1, 4, 2]);
    assert_safety!(service, true, [2, 3, 4, 0, 1]);
    assert_eq!(
        service.with_engine(|engine| engine.check_invariants()).unwrap(),
        Ok(())
    );
}

#[tokio::test]
async fn integration_circular_wait_detected_and_resolved() {
    init_tracing();
    let mut service = Scenario::circular_wait().service();

    assert_safety!(service, false, []);
    assert_eq!(
        service.call(AllocationRequest::DetectDeadlock).await.unwrap(),
        AllocationResponse::Deadlock { deadlocked: vec![0, 1, 2] }
    );
    assert_eq!(
        service.call(AllocationRequest::ResolveDeadlock).await.unwrap(),
        AllocationResponse::Resolution(Resolution::Resolved { preempted: vec![0] })
    );
    assert_eq!(
        service.call(AllocationRequest::DetectDeadlock).await.unwrap(),
        AllocationResponse::Deadlock { deadlocked: vec![] }
    );

    let snapshot = snapshot!(service);
    assert_eq!(snapshot.available, vec![1, 1]);
    assert_eq!(snapshot.allocation[0], vec![0, 0]);
    assert_eq!(snapshot.maximum[0], vec![2, 2]);
    assert_eq!(snapshot.need[0], vec![2, 2]);
}

#[tokio::test]
async fn integration_release_beyond_allocation_denied() {
    init_tracing();
    let mut service = Scenario::circular_wait().service();
    let before = snapshot!(service);

    assert_eq!(
        service
            .call(AllocationRequest::Release { customer: 2, units: vec![1, 2] })
            .await
            .unwrap_err(),
        AllocationError::InvalidQuantity {
            customer: 2,
            resource: 1,
            requested: 2,
            limit: 1,
            kind: QuantityLimit::Allocation,
        }
    );
    assert_eq!(snapshot!(service), before);

    // Releasing breaks the circular wait without any preemption.
    release!(service, 2, [1, 1]);
    assert_safety!(service, true, [0, 1, 2]);
}
