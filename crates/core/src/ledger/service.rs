//! Mutation gates for journal entries.
//!
//! Combines the fiscal-year and tax-regularization rules into the checks the
//! persistence layer runs before creating, modifying, or deleting an entry.
//! The year's designated system entries (opening/closing/profit-and-loss)
//! are exempt from both the closed-year rule and the lock-period rule.

use crate::fiscal::{locked_period_for, FiscalYear, TaxRegularizationPeriod};

use super::entry::JournalEntry;
use super::error::LedgerError;
use super::types::EntryTotals;
use super::validation::check_entry;

/// Ledger service validating entries against fiscal rules.
///
/// Pure business logic with no database dependencies; callers load the year
/// and its periods and pass them in.
pub struct LedgerService;

impl LedgerService {
    /// Validates an entry for posting: structure, balance, and fiscal gates.
    ///
    /// A zero stored amount means "not yet computed" and is skipped; any
    /// other stored amount must match the recomputation from the lines.
    ///
    /// # Errors
    ///
    /// - structural/balance errors from [`check_entry`]
    /// - [`LedgerError::AmountMismatch`] for a stale cached amount
    /// - [`LedgerError::DateOutsideYear`] if the date misses the year range
    /// - [`LedgerError::YearClosed`] if the year refuses posting
    /// - [`LedgerError::DateInLockedPeriod`] if the date is regularized and
    ///   the entry is not a system entry
    pub fn validate_entry(
        entry: &JournalEntry,
        year: &FiscalYear,
        periods: &[TaxRegularizationPeriod],
    ) -> Result<EntryTotals, LedgerError> {
        let totals = check_entry(&entry.lines)?;

        if !entry.amount.is_zero() && entry.amount != totals.amount() {
            return Err(LedgerError::AmountMismatch {
                stored: entry.amount,
                computed: totals.amount(),
            });
        }

        if !year.contains(entry.date) {
            return Err(LedgerError::DateOutsideYear {
                date: entry.date,
                year: year.code.clone(),
            });
        }

        Self::check_gates(entry, year, periods)?;

        Ok(totals)
    }

    /// Validates that an entry may be modified (date change, line edits).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotEditable`] for flagged entries, plus the
    /// gate errors of [`Self::validate_can_delete`].
    pub fn validate_can_modify(
        entry: &JournalEntry,
        year: &FiscalYear,
        periods: &[TaxRegularizationPeriod],
    ) -> Result<(), LedgerError> {
        if !entry.editable && !year.is_system_entry(entry.id) {
            return Err(LedgerError::NotEditable(entry.id));
        }
        Self::check_gates(entry, year, periods)
    }

    /// Validates that an entry may be deleted.
    ///
    /// Deletion requires an open year (or a system entry) and a date outside
    /// every regularized interval.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::YearClosed`] or
    /// [`LedgerError::DateInLockedPeriod`].
    pub fn validate_can_delete(
        entry: &JournalEntry,
        year: &FiscalYear,
        periods: &[TaxRegularizationPeriod],
    ) -> Result<(), LedgerError> {
        Self::check_gates(entry, year, periods)
    }

    fn check_gates(
        entry: &JournalEntry,
        year: &FiscalYear,
        periods: &[TaxRegularizationPeriod],
    ) -> Result<(), LedgerError> {
        let system_entry = year.is_system_entry(entry.id);

        if !year.is_open() && !system_entry {
            return Err(LedgerError::YearClosed(year.code.clone()));
        }

        if !system_entry && locked_period_for(periods, entry.date).is_some() {
            return Err(LedgerError::DateInLockedPeriod(entry.date));
        }

        Ok(())
    }
}
