use super::fixtures::{Lcg, Scenario};
use crate::allocation::{Units, core::engine::AllocationEngine, error::AllocationError};

/// Random but consistent tables: allocations within maxima, totals covering
/// the allocations with a few spare units. Maxima may exceed totals, so the
/// generated state is not necessarily safe.
fn random_engine(rng: &mut Lcg) -> AllocationEngine {
    let customers = 1 + rng.next_below(6) as usize;
    let resources = 1 + rng.next_below(4) as usize;
    let maximum: Vec<Vec<Units>> =
        (0..customers).map(|_| (0..resources).map(|_| rng.next_below(7)).collect()).collect();
    let allocation: Vec<Vec<Units>> = maximum.iter().map(|row| rng.units_up_to(row)).collect();
    let total_units = (0..resources)
        .map(|r| allocation.iter().map(|row| row[r]).sum::<Units>() + rng.next_below(4))
        .collect();
    AllocationEngine::new(total_units, maximum, allocation).unwrap()
}

/// Apply one random operation, checking the per-operation properties.
fn random_step(engine: &mut AllocationEngine, rng: &mut Lcg) {
    let customer = rng.next_below(engine.customers() as u32) as usize;
    let before = engine.clone();
    let was_safe = engine.is_safe();

    match rng.next_below(10) {
        0..=4 => {
            // Occasionally one above need, to exercise denials.
            let bounds: Vec<Units> = engine.need(customer).unwrap().iter().map(|n| n + 1).collect();
            let units = rng.units_up_to(&bounds);
            match engine.request(customer, &units) {
                Ok(()) => assert!(engine.is_safe(), "granted request left an unsafe state"),
                Err(e) => {
                    assert!(
                        e.is_invalid_quantity() || e == AllocationError::UnsafeState { customer },
                        "unexpected denial: {e}"
                    );
                    assert_eq!(*engine, before, "denied request was not rolled back exactly");
                }
            }
        }
        5..=8 => {
            let bounds = engine.allocation(customer).unwrap().to_vec();
            let units = rng.units_up_to(&bounds);
            engine.release(customer, &units).unwrap();
            if was_safe {
                assert!(engine.is_safe(), "release made a safe state unsafe");
            }
        }
        _ => {
            let first = engine.detect_deadlock();
            assert_eq!(engine.detect_deadlock(), first);
            assert_eq!(*engine, before, "detection mutated the engine");
            if first {
                let resolution = engine.resolve_deadlock();
                assert_eq!(resolution.is_resolved(), !engine.detect_deadlock());
            }
        }
    }

    assert_eq!(engine.check_invariants(), Ok(()));
}

#[test]
fn property_classic_scenario_random_operations() {
    super::init_tracing();
    let mut rng = Lcg::new(0x5eed);
    let mut engine = Scenario::classic().engine();
    for _ in 0..2000 {
        random_step(&mut engine, &mut rng);
        // Starting safe, grants and releases keep the system safe.
        assert!(engine.is_safe());
    }
}

#[test]
fn property_random_configurations_random_operations() {
    super::init_tracing();
    let mut rng = Lcg::new(42);
    for _ in 0..200 {
        let mut engine = random_engine(&mut rng);
        assert_eq!(engine.check_invariants(), Ok(()));
        for _ in 0..50 {
            random_step(&mut engine, &mut rng);
        }
    }
}

#[test]
fn property_release_over_allocation_rejected_without_mutation() {
    super::init_tracing();
    let mut engine = Scenario::classic().engine();
    let before = engine.clone();
    for customer in 0..engine.customers() {
        let mut units = engine.allocation(customer).unwrap().to_vec();
        units[3] += 1;
        assert!(engine.release(customer, &units).unwrap_err().is_invalid_quantity());
        assert_eq!(engine, before);
    }
}

#[test]
fn property_detection_matches_safety() {
    super::init_tracing();
    let mut rng = Lcg::new(7);
    for _ in 0..300 {
        let engine = random_engine(&mut rng);
        assert_eq!(engine.detect_deadlock(), !engine.is_safe());
        assert_eq!(engine.deadlocked_customers().is_empty(), engine.safe_sequence().is_some());
        if let Some(sequence) = engine.safe_sequence() {
            let mut sorted = sequence.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..engine.customers()).collect::<Vec<_>>());
        }
    }
}
