//! Bit arena allocation and scanning

use proptest::prelude::*;
use seu_detector::BitArena;

#[test]
fn scan_finds_lowest_set_bit() {
    let mut arena = BitArena::new();
    arena.allocate(10_000).unwrap();
    arena.inject_fault(9_999);
    arena.inject_fault(4_242);
    assert_eq!(arena.scan(), Some(4_242));
}

#[test]
fn shrinking_drops_faults_beyond_new_length() {
    let mut arena = BitArena::new();
    arena.allocate(2_048).unwrap();
    arena.inject_fault(2_000);
    arena.allocate(1_024).unwrap();
    assert_eq!(arena.len(), 1_024);
    assert_eq!(arena.scan(), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fresh_arena_scans_clean(len in 0u64..200_000) {
        let mut arena = BitArena::new();
        arena.allocate(len).unwrap();
        prop_assert_eq!(arena.len_bits(), len);
        prop_assert_eq!(arena.scan(), None);
    }

    #[test]
    fn injected_bit_is_reported(len in 1u64..200_000, pick in any::<prop::sample::Index>()) {
        let mut arena = BitArena::new();
        arena.allocate(len).unwrap();
        let index = pick.index(len as usize);
        prop_assert!(arena.inject_fault(index));
        prop_assert_eq!(arena.scan(), Some(index));
    }
}
