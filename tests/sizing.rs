//! Sizing policy decision table

use proptest::prelude::*;
use seu_detector::{desired_bits, SizingDecision, SizingPolicy};
use test_case::test_case;

#[test_case(0, 1000 => SizingDecision::UpdateNoCheck ; "first allocation")]
#[test_case(1000, 0 => SizingDecision::UpdateNoCheck ; "memory exhausted")]
#[test_case(0, 0 => SizingDecision::NoUpdate ; "nothing to monitor")]
#[test_case(1000, 1300 => SizingDecision::UpdateWithCheck ; "substantial growth")]
#[test_case(1000, 700 => SizingDecision::UpdateNoCheck ; "substantial shrink")]
#[test_case(1000, 1100 => SizingDecision::NoUpdate ; "small growth")]
#[test_case(1000, 900 => SizingDecision::NoUpdate ; "small shrink")]
#[test_case(1000, 1000 => SizingDecision::NoUpdate ; "unchanged")]
fn decide_without_force(current: u64, desired: u64) -> SizingDecision {
    let mut force = false;
    SizingPolicy::default().decide(&mut force, current, desired)
}

#[test_case(0, 0 ; "both empty")]
#[test_case(1000, 1000 ; "unchanged")]
#[test_case(1000, 5000 ; "growth")]
fn forced_reinit_bypasses_comparison(current: u64, desired: u64) {
    let policy = SizingPolicy::default();
    let mut force = true;
    assert_eq!(
        policy.decide(&mut force, current, desired),
        SizingDecision::UpdateNoCheck
    );
    assert!(!force, "force flag must be consumed");
}

#[test]
fn desired_bits_for_one_gigabyte() {
    let bits = desired_bits(1_000_000_000, 0, 0.75);
    assert_eq!(bits, 6_000_000_000);
}

proptest! {
    #[test]
    fn decide_is_deterministic(current in 0u64..1_000_000, desired in 0u64..1_000_000) {
        let policy = SizingPolicy::default();
        let mut a = false;
        let mut b = false;
        prop_assert_eq!(
            policy.decide(&mut a, current, desired),
            policy.decide(&mut b, current, desired)
        );
        prop_assert!(!a && !b);
    }

    #[test]
    fn force_flag_always_cleared(current in 0u64..1_000_000, desired in 0u64..1_000_000) {
        let policy = SizingPolicy::default();
        let mut force = true;
        prop_assert_eq!(policy.decide(&mut force, current, desired), SizingDecision::UpdateNoCheck);
        prop_assert!(!force);
    }

    #[test]
    fn growth_never_skips_checkpoint_when_updating(current in 1u64..1_000_000, extra in 1u64..1_000_000) {
        let mut force = false;
        let decision = SizingPolicy::default().decide(&mut force, current, current + extra);
        prop_assert_ne!(decision, SizingDecision::UpdateNoCheck);
    }
}
