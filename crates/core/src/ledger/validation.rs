//! Balance validation for journal entries.

use super::error::LedgerError;
use super::line::LedgerLine;
use super::types::EntryTotals;

/// Recomputes debit/credit totals over a set of lines.
///
/// Sums are taken at full precision and rounded to amount precision on the
/// resulting totals, so sub-cent drift across many lines cancels out rather
/// than accumulating.
#[must_use]
pub fn entry_totals(lines: &[LedgerLine]) -> EntryTotals {
    let debit = lines.iter().map(|l| l.debit).sum();
    let credit = lines.iter().map(|l| l.credit).sum();
    EntryTotals::new(debit, credit)
}

/// Validates the structural and balance invariants of an entry's lines.
///
/// # Errors
///
/// - [`LedgerError::EmptyEntry`] if there are no lines
/// - [`LedgerError::DebitAndCredit`] if any line carries both sides
/// - [`LedgerError::Unbalanced`] if the rounded totals differ
pub fn check_entry(lines: &[LedgerLine]) -> Result<EntryTotals, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }

    for line in lines {
        line.check_sides()?;
    }

    let totals = entry_totals(lines);
    if !totals.is_balanced {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::line::tests::make_line;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balanced_lines() {
        let lines = vec![make_line(dec!(100), dec!(0)), make_line(dec!(0), dec!(100))];
        let totals = check_entry(&lines).unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.credit, dec!(100.00));
    }

    #[test]
    fn test_unbalanced_lines() {
        let lines = vec![
            make_line(dec!(100), dec!(0)),
            make_line(dec!(0), dec!(99.99)),
        ];
        assert!(matches!(
            check_entry(&lines),
            Err(LedgerError::Unbalanced { .. })
        ));
    }

    #[test]
    fn test_no_lines() {
        assert!(matches!(check_entry(&[]), Err(LedgerError::EmptyEntry)));
    }

    #[test]
    fn test_both_sides_rejected() {
        let lines = vec![
            make_line(dec!(100), dec!(10)),
            make_line(dec!(0), dec!(90)),
        ];
        assert!(matches!(
            check_entry(&lines),
            Err(LedgerError::DebitAndCredit(_))
        ));
    }

    #[test]
    fn test_sub_cent_drift_tolerated() {
        // Raw sums differ by 0.004, which disappears at amount precision.
        let lines = vec![
            make_line(dec!(33.333), dec!(0)),
            make_line(dec!(66.671), dec!(0)),
            make_line(dec!(0), dec!(100.00)),
        ];
        let totals = check_entry(&lines).unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.credit, dec!(100.00));
    }

    #[test]
    fn test_multi_line_balanced() {
        let lines = vec![
            make_line(dec!(60), dec!(0)),
            make_line(dec!(40), dec!(0)),
            make_line(dec!(0), dec!(75)),
            make_line(dec!(0), dec!(25)),
        ];
        let totals = check_entry(&lines).unwrap();
        assert!(totals.is_balanced);
        assert_eq!(totals.amount(), dec!(100.00));
    }
}
