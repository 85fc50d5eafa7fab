//! Sequential numbering of journal entries within a fiscal year.
//!
//! Numbers are dense (1..N) under normal operation, but legacy data can
//! carry gaps. Assignment reuses the first gap; renumbering rebuilds the
//! whole sequence in (date, id) order.

use balanz_shared::types::JournalEntryId;
use serde::{Deserialize, Serialize};

/// Page size used when a renumber walks a fiscal year's entries.
pub const RENUMBER_PAGE_SIZE: u64 = 1000;

/// Picks the next entry number for a fiscal year.
///
/// Scans the existing numbers ascending for the first integer gap starting
/// from 1; if the sequence is dense, returns max+1. Always succeeds by
/// construction (an empty year yields 1).
#[must_use]
pub fn next_number(existing: &[i64]) -> i64 {
    let mut numbers: Vec<i64> = existing.iter().copied().filter(|&n| n > 0).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let mut expected = 1;
    for n in numbers {
        if n > expected {
            break;
        }
        expected = n + 1;
    }
    expected
}

/// One renumbering change: an entry moving from `old_number` to `new_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenumberAssignment {
    /// The entry being renumbered.
    pub entry_id: JournalEntryId,
    /// The number it currently holds.
    pub old_number: i64,
    /// The number it should hold.
    pub new_number: i64,
}

/// Computes the renumbering plan for a fiscal year.
///
/// `ordered` must already be sorted by (date, id) ascending; positions map to
/// numbers 1..N. Only entries whose number actually changes appear in the
/// plan, so an already-dense year yields an empty plan.
#[must_use]
pub fn renumber_plan(ordered: &[(JournalEntryId, i64)]) -> Vec<RenumberAssignment> {
    renumber_plan_from(ordered, 1)
}

/// Computes a renumbering plan starting from an arbitrary number.
///
/// Used when a year is walked in pages: each page continues where the
/// previous one left off.
#[must_use]
pub fn renumber_plan_from(
    ordered: &[(JournalEntryId, i64)],
    first_number: i64,
) -> Vec<RenumberAssignment> {
    ordered
        .iter()
        .enumerate()
        .filter_map(|(position, &(entry_id, old_number))| {
            #[allow(clippy::cast_possible_wrap)]
            let new_number = first_number + position as i64;
            (old_number != new_number).then_some(RenumberAssignment {
                entry_id,
                old_number,
                new_number,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_number_empty() {
        assert_eq!(next_number(&[]), 1);
    }

    #[test]
    fn test_next_number_dense() {
        assert_eq!(next_number(&[1, 2, 3]), 4);
    }

    #[test]
    fn test_next_number_fills_first_gap() {
        assert_eq!(next_number(&[1, 2, 4, 5]), 3);
        assert_eq!(next_number(&[2, 3]), 1);
    }

    #[test]
    fn test_next_number_unsorted_input() {
        assert_eq!(next_number(&[5, 1, 3, 2]), 4);
    }

    #[test]
    fn test_next_number_ignores_non_positive() {
        assert_eq!(next_number(&[0, -3, 1]), 2);
    }

    #[test]
    fn test_renumber_plan_dense_year_is_noop() {
        let ordered: Vec<_> = (1..=5).map(|n| (JournalEntryId::new(), n)).collect();
        assert!(renumber_plan(&ordered).is_empty());
    }

    #[test]
    fn test_renumber_plan_closes_gaps() {
        let ids: Vec<_> = (0..4).map(|_| JournalEntryId::new()).collect();
        let ordered = vec![(ids[0], 1), (ids[1], 3), (ids[2], 4), (ids[3], 9)];
        let plan = renumber_plan(&ordered);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].entry_id, ids[1]);
        assert_eq!(plan[0].new_number, 2);
        assert_eq!(plan[1].entry_id, ids[2]);
        assert_eq!(plan[1].new_number, 3);
        assert_eq!(plan[2].entry_id, ids[3]);
        assert_eq!(plan[2].new_number, 4);
    }

    #[test]
    fn test_renumber_plan_from_continues_across_pages() {
        let ids: Vec<_> = (0..3).map(|_| JournalEntryId::new()).collect();
        // Second page of a paged walk: positions 1001..1003.
        let ordered = vec![(ids[0], 1001), (ids[1], 1005), (ids[2], 1006)];
        let plan = renumber_plan_from(&ordered, 1001);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].new_number, 1002);
        assert_eq!(plan[1].new_number, 1003);
    }

    #[test]
    fn test_renumber_plan_reorders_swapped_numbers() {
        let ids: Vec<_> = (0..2).map(|_| JournalEntryId::new()).collect();
        // Date order says ids[0] first, but it holds the higher number.
        let ordered = vec![(ids[0], 2), (ids[1], 1)];
        let plan = renumber_plan(&ordered);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].new_number, 1);
        assert_eq!(plan[1].new_number, 2);
    }
}
