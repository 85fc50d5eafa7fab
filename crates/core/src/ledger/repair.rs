//! Best-effort rebalance routine for journal entries.
//!
//! Imported entries sometimes arrive with sub-cent drift between the debit
//! and credit totals. [`rebalance`] first normalizes every line to amount
//! precision and, if a residual remains, absorbs it entirely into the first
//! line. The first line is the single correction point; no other line is
//! ever touched.

use balanz_shared::types::{amount::round_amount, LedgerLineId};
use serde::{Deserialize, Serialize};

use super::entry::JournalEntry;
use super::error::LedgerError;
use super::types::EntryTotals;
use super::validation::entry_totals;

/// How an entry was brought back into balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Totals already matched; nothing to absorb.
    AlreadyBalanced,
    /// Rounding every line to amount precision was enough.
    Rounded,
    /// A residual was applied to the first line's non-zero side.
    ResidualApplied,
}

/// Result of a successful rebalance.
#[derive(Debug, Clone)]
pub struct RepairReport {
    /// How balance was restored.
    pub outcome: RepairOutcome,
    /// Lines whose stored values changed and need persisting.
    pub changed_lines: Vec<LedgerLineId>,
    /// Totals after the repair.
    pub totals: EntryTotals,
    /// Whether the entry's cached amount changed.
    pub amount_changed: bool,
}

/// Attempts to restore the balance invariant of an entry in place.
///
/// Steps:
/// 1. Round every line's debit/credit to amount precision and recheck.
/// 2. If a residual remains, apply it entirely to the first line's non-zero
///    side and recheck.
/// 3. Refresh the entry's cached amount.
///
/// # Errors
///
/// - [`LedgerError::EmptyEntry`] if the entry has no lines
/// - [`LedgerError::RepairFailed`] if the residual cannot be absorbed (the
///   first line carries no movement) or the recheck still fails
pub fn rebalance(entry: &mut JournalEntry) -> Result<RepairReport, LedgerError> {
    if entry.lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }

    let mut changed_lines = Vec::new();

    let totals = entry_totals(&entry.lines);
    if totals.is_balanced {
        let amount_changed = entry.refresh_amount();
        return Ok(RepairReport {
            outcome: RepairOutcome::AlreadyBalanced,
            changed_lines,
            totals,
            amount_changed,
        });
    }

    // Pass 1: normalize every line to amount precision.
    for line in &mut entry.lines {
        let debit = round_amount(line.debit);
        let credit = round_amount(line.credit);
        if debit != line.debit || credit != line.credit {
            line.debit = debit;
            line.credit = credit;
            changed_lines.push(line.id);
        }
    }

    let totals = entry_totals(&entry.lines);
    if totals.is_balanced {
        let amount_changed = entry.refresh_amount();
        return Ok(RepairReport {
            outcome: RepairOutcome::Rounded,
            changed_lines,
            totals,
            amount_changed,
        });
    }

    // Pass 2: absorb the residual into the first line's non-zero side.
    let residual = totals.difference();
    let first = &mut entry.lines[0];
    if !first.debit.is_zero() {
        first.debit -= residual;
    } else if !first.credit.is_zero() {
        first.credit += residual;
    } else {
        return Err(LedgerError::RepairFailed {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    if !changed_lines.contains(&first.id) {
        changed_lines.push(first.id);
    }

    let totals = entry_totals(&entry.lines);
    if !totals.is_balanced {
        return Err(LedgerError::RepairFailed {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    let amount_changed = entry.refresh_amount();
    Ok(RepairReport {
        outcome: RepairOutcome::ResidualApplied,
        changed_lines,
        totals,
        amount_changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::tests::make_entry;
    use rust_decimal_macros::dec;

    #[test]
    fn test_already_balanced() {
        let mut entry = make_entry(vec![(dec!(100), dec!(0)), (dec!(0), dec!(100))]);
        let report = rebalance(&mut entry).unwrap();
        assert_eq!(report.outcome, RepairOutcome::AlreadyBalanced);
        assert!(report.changed_lines.is_empty());
        assert!(report.amount_changed);
        assert_eq!(entry.amount, dec!(100.00));
    }

    #[test]
    fn test_rounding_restores_balance() {
        // Two drifted debit lines sum to 20.008, which rounds up to 20.01
        // against a 20.00 credit; rounding each line to amount precision is
        // enough to rebalance.
        let mut entry = make_entry(vec![
            (dec!(10.004), dec!(0)),
            (dec!(10.004), dec!(0)),
            (dec!(0), dec!(20)),
        ]);
        let report = rebalance(&mut entry).unwrap();
        assert_eq!(report.outcome, RepairOutcome::Rounded);
        assert_eq!(report.changed_lines.len(), 2);
        assert_eq!(entry.lines[0].debit, dec!(10.00));
        assert_eq!(entry.lines[1].debit, dec!(10.00));
        assert_eq!(entry.amount, dec!(20.00));
    }

    #[test]
    fn test_one_cent_residual_applied_to_first_line() {
        // The §8 workhorse: debit 100 vs credit 99.99.
        let mut entry = make_entry(vec![(dec!(100), dec!(0)), (dec!(0), dec!(99.99))]);
        let report = rebalance(&mut entry).unwrap();
        assert_eq!(report.outcome, RepairOutcome::ResidualApplied);
        assert_eq!(entry.lines[0].debit, dec!(99.99));
        assert_eq!(entry.lines[1].credit, dec!(99.99));
        assert!(entry.is_balanced());
        assert_eq!(entry.amount, dec!(99.99));
    }

    #[test]
    fn test_residual_applied_to_credit_side() {
        // First line is a credit line, so the residual lands on its credit.
        let mut entry = make_entry(vec![(dec!(0), dec!(99.99)), (dec!(100), dec!(0))]);
        let report = rebalance(&mut entry).unwrap();
        assert_eq!(report.outcome, RepairOutcome::ResidualApplied);
        assert_eq!(entry.lines[0].credit, dec!(100.00));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_zero_first_line_cannot_absorb() {
        let mut entry = make_entry(vec![
            (dec!(0), dec!(0)),
            (dec!(100), dec!(0)),
            (dec!(0), dec!(99.99)),
        ]);
        assert!(matches!(
            rebalance(&mut entry),
            Err(LedgerError::RepairFailed { .. })
        ));
    }

    #[test]
    fn test_empty_entry() {
        let mut entry = make_entry(vec![]);
        assert!(matches!(rebalance(&mut entry), Err(LedgerError::EmptyEntry)));
    }

    #[test]
    fn test_only_first_line_is_touched() {
        let mut entry = make_entry(vec![
            (dec!(50), dec!(0)),
            (dec!(50), dec!(0)),
            (dec!(0), dec!(99.97)),
        ]);
        let before: Vec<_> = entry.lines[1..]
            .iter()
            .map(|l| (l.debit, l.credit))
            .collect();
        let report = rebalance(&mut entry).unwrap();
        assert_eq!(report.outcome, RepairOutcome::ResidualApplied);
        let after: Vec<_> = entry.lines[1..]
            .iter()
            .map(|l| (l.debit, l.credit))
            .collect();
        assert_eq!(before, after);
        assert_eq!(entry.lines[0].debit, dec!(49.97));
        assert!(entry.is_balanced());
    }
}
