//! Property-based tests for entry numbering and renumbering.

use balanz_shared::types::JournalEntryId;
use proptest::prelude::*;

use super::numbering::{next_number, renumber_plan};

/// Strategy for sets of existing entry numbers, possibly with gaps.
fn numbers_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..200, 0..50)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The assigned number is never already taken.
    #[test]
    fn prop_next_number_is_free(existing in numbers_strategy()) {
        let next = next_number(&existing);
        prop_assert!(!existing.contains(&next), "assigned number {next} already taken");
    }

    /// The assigned number is positive and at most max+1.
    #[test]
    fn prop_next_number_bounded(existing in numbers_strategy()) {
        let next = next_number(&existing);
        let max = existing.iter().copied().max().unwrap_or(0);
        prop_assert!(next >= 1);
        prop_assert!(next <= max + 1);
    }

    /// Every number below the assigned one is already taken (first gap).
    #[test]
    fn prop_next_number_is_first_gap(existing in numbers_strategy()) {
        let next = next_number(&existing);
        for n in 1..next {
            prop_assert!(existing.contains(&n), "gap at {n} skipped in favor of {next}");
        }
    }

    /// Repeated assignment fills gaps in strictly increasing order.
    #[test]
    fn prop_assignments_strictly_increase(mut existing in numbers_strategy(), extra in 2usize..20) {
        let mut assigned = Vec::with_capacity(extra);
        for _ in 0..extra {
            let next = next_number(&existing);
            assigned.push(next);
            existing.push(next);
        }
        for pair in assigned.windows(2) {
            prop_assert!(pair[0] < pair[1], "assignments not increasing: {assigned:?}");
        }
        // Number 1 is taken after the first assignment at the latest.
        prop_assert!(existing.contains(&1));
    }
}

/// Strategy for a year's entries in (date, id) order with arbitrary numbers.
fn ordered_entries_strategy() -> impl Strategy<Value = Vec<(JournalEntryId, i64)>> {
    prop::collection::vec(1i64..500, 1..80)
        .prop_map(|numbers| numbers.into_iter().map(|n| (JournalEntryId::new(), n)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Applying the plan yields exactly the permutation 1..N in input order.
    #[test]
    fn prop_renumber_yields_permutation(ordered in ordered_entries_strategy()) {
        let plan = renumber_plan(&ordered);

        // Apply the plan over the input.
        let mut final_numbers: Vec<i64> = ordered.iter().map(|&(_, n)| n).collect();
        for assignment in &plan {
            let position = ordered
                .iter()
                .position(|&(id, _)| id == assignment.entry_id)
                .expect("plan references an input entry");
            final_numbers[position] = assignment.new_number;
        }

        let expected: Vec<i64> = (1..=ordered.len() as i64).collect();
        prop_assert_eq!(final_numbers, expected);
    }

    /// The plan only contains entries whose number actually changes.
    #[test]
    fn prop_renumber_plan_minimal(ordered in ordered_entries_strategy()) {
        for assignment in renumber_plan(&ordered) {
            prop_assert_ne!(assignment.old_number, assignment.new_number);
        }
    }

    /// Renumbering an already-dense year is a no-op.
    #[test]
    fn prop_renumber_dense_noop(len in 1usize..80) {
        let ordered: Vec<_> = (1..=len as i64).map(|n| (JournalEntryId::new(), n)).collect();
        prop_assert!(renumber_plan(&ordered).is_empty());
    }
}
