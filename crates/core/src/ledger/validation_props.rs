//! Property-based tests for balance validation and the rebalance routine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::tests::make_entry;
use super::error::LedgerError;
use super::repair::rebalance;
use super::validation::{check_entry, entry_totals};

/// Strategy for a positive two-decimal amount.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a balanced set of (debit, credit) line pairs: each amount is
/// posted once on the debit side and once on the credit side.
fn balanced_lines_strategy() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    prop::collection::vec(amount_strategy(), 1..10).prop_map(|amounts| {
        let mut lines = Vec::with_capacity(amounts.len() * 2);
        for amount in amounts {
            lines.push((amount, Decimal::ZERO));
            lines.push((Decimal::ZERO, amount));
        }
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced line sets always validate, and the totals agree per side.
    #[test]
    fn prop_balanced_lines_validate(lines in balanced_lines_strategy()) {
        let entry = make_entry(lines);
        let totals = check_entry(&entry.lines).expect("balanced entry must validate");
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Perturbing one side by at least a cent breaks validation.
    #[test]
    fn prop_cent_perturbation_unbalances(
        lines in balanced_lines_strategy(),
        cents in 1i64..100,
    ) {
        let mut entry = make_entry(lines);
        entry.lines[0].debit += Decimal::new(cents, 2);
        prop_assert!(
            matches!(
                check_entry(&entry.lines),
                Err(LedgerError::Unbalanced { .. })
            ),
            "perturbed entry must be unbalanced"
        );
    }

    /// After a successful rebalance the entry validates and the amount
    /// equals max(|debit|, |credit|) of the repaired totals.
    #[test]
    fn prop_rebalance_restores_invariant(
        lines in balanced_lines_strategy(),
        drift_cents in 1i64..5,
    ) {
        let mut entry = make_entry(lines);
        entry.lines[0].debit += Decimal::new(drift_cents, 2);

        let report = rebalance(&mut entry).expect("drifted entry must repair");
        prop_assert!(report.totals.is_balanced);
        let totals = entry_totals(&entry.lines);
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(entry.amount, totals.amount());
        prop_assert!(check_entry(&entry.lines).is_ok());
    }

    /// Rebalance never touches any line beyond the first.
    #[test]
    fn prop_rebalance_touches_only_first_line(
        lines in balanced_lines_strategy(),
        drift_cents in 1i64..5,
    ) {
        let mut entry = make_entry(lines);
        entry.lines[0].debit += Decimal::new(drift_cents, 2);

        let tail_before: Vec<(Decimal, Decimal)> = entry.lines[1..]
            .iter()
            .map(|l| (l.debit, l.credit))
            .collect();

        rebalance(&mut entry).expect("drifted entry must repair");

        let tail_after: Vec<(Decimal, Decimal)> = entry.lines[1..]
            .iter()
            .map(|l| (l.debit, l.credit))
            .collect();
        prop_assert_eq!(tail_before, tail_after);
    }

    /// Rebalance is idempotent: a second pass reports no changed lines.
    #[test]
    fn prop_rebalance_idempotent(
        lines in balanced_lines_strategy(),
        drift_cents in 1i64..5,
    ) {
        let mut entry = make_entry(lines);
        entry.lines[0].debit += Decimal::new(drift_cents, 2);

        rebalance(&mut entry).expect("first pass");
        let second = rebalance(&mut entry).expect("second pass");
        prop_assert!(second.changed_lines.is_empty());
        prop_assert!(!second.amount_changed);
    }
}
