use crate::allocation::{Units, core::engine::AllocationEngine};

/// Initial tables of an allocation scenario.
#[derive(Debug, Clone)]
pub(super) struct Scenario {
    pub total_units: Vec<Units>,
    pub maximum: Vec<Vec<Units>>,
    pub allocation: Vec<Vec<Units>>,
}

impl Scenario {
    /// Five customers, four resource types, `[15, 8, 18, 7]` units in total and
    /// `[2, 1, 1, 2]` left in the free pool. The state is safe with the
    /// completion order `0, 2, 3, 4, 1`.
    pub fn classic() -> Self {
        Self {
            total_units: vec![15, 8, 18, 7],
            maximum: vec![
                vec![4, 1, 5, 2],
                vec![7, 4, 8, 3],
                vec![7, 4, 9, 3],
                vec![7, 5, 8, 3],
                vec![8, 5, 11, 4],
            ],
            allocation: vec![
                vec![3, 1, 4, 1],
                vec![2, 1, 3, 1],
                vec![4, 2, 5, 1],
                vec![1, 2, 2, 1],
                vec![3, 1, 3, 1],
            ],
        }
    }

    /// Nothing is free and every customer waits on units held by the others.
    pub fn circular_wait() -> Self {
        Self {
            total_units: vec![3, 3],
            maximum: vec![vec![2, 2], vec![2, 2], vec![2, 2]],
            allocation: vec![vec![1, 1], vec![1, 1], vec![1, 1]],
        }
    }

    pub fn engine(&self) -> AllocationEngine {
        AllocationEngine::new(
            self.total_units.clone(),
            self.maximum.clone(),
            self.allocation.clone(),
        )
        .unwrap()
    }

    pub fn service(&self) -> crate::allocation::api::service::AllocationApiService {
        crate::allocation::init_allocator(
            self.total_units.clone(),
            self.maximum.clone(),
            self.allocation.clone(),
        )
        .unwrap()
    }
}

/// Linear congruential generator driving reproducible operation sequences.
pub(super) struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_below(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        if bound == 0 { 0 } else { ((self.0 >> 33) % u64::from(bound)) as u32 }
    }

    /// A vector of `len` values, each in `0..=bounds[i]`.
    pub fn units_up_to(&mut self, bounds: &[Units]) -> Vec<Units> {
        bounds.iter().map(|&b| self.next_below(b + 1)).collect()
    }
}

macro_rules! grant {
    ($service:expr, $customer:expr, $units:expr) => {
        assert_eq!(
            $service
                .call(crate::allocation::api::AllocationRequest::Request {
                    customer: $customer,
                    units: $units.to_vec(),
                })
                .await
                .unwrap(),
            crate::allocation::api::AllocationResponse::Granted
        )
    };
}

macro_rules! deny {
    ($service:expr, $customer:expr, $units:expr, $error:pat) => {
        match $service
            .call(crate::allocation::api::AllocationRequest::Request {
                customer: $customer,
                units: $units.to_vec(),
            })
            .await
        {
            Err($error) => {}
            other => panic!("Expected denial, got {:?}", other),
        }
    };
}

macro_rules! release {
    ($service:expr, $customer:expr, $units:expr) => {
        assert_eq!(
            $service
                .call(crate::allocation::api::AllocationRequest::Release {
                    customer: $customer,
                    units: $units.to_vec(),
                })
                .await
                .unwrap(),
            crate::allocation::api::AllocationResponse::Released
        )
    };
}

macro_rules! assert_safety {
    ($service:expr, $safe:expr, $sequence:expr) => {
        assert_eq!(
            $service.call(crate::allocation::api::AllocationRequest::CheckSafety).await.unwrap(),
            crate::allocation::api::AllocationResponse::Safety {
                safe: $safe,
                sequence: $sequence.to_vec(),
            }
        )
    };
}

macro_rules! snapshot {
    ($service:expr) => {
        match $service.call(crate::allocation::api::AllocationRequest::Snapshot).await.unwrap() {
            crate::allocation::api::AllocationResponse::Snapshot(snapshot) => snapshot,
            other => panic!("Expected AllocationResponse::Snapshot, got {:?}", other),
        }
    };
}
