//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations:
//! validation errors, fiscal gating errors, referential errors, and
//! numbering errors.

use balanz_shared::types::{JournalEntryId, LedgerLineId, YearCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal entry has no lines.
    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    /// A line carries both a debit and a credit amount.
    #[error("Line {0} has both debit and credit set")]
    DebitAndCredit(LedgerLineId),

    /// Entry is not balanced (debits != credits at amount precision).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Stored entry amount differs from the recomputed amount.
    #[error("Entry amount mismatch: stored {stored}, computed {computed}")]
    AmountMismatch {
        /// Amount stored on the entry header.
        stored: Decimal,
        /// Amount recomputed from the lines.
        computed: Decimal,
    },

    /// Best-effort rebalance could not absorb the residual.
    #[error("Rebalance failed. Debit: {debit}, Credit: {credit}")]
    RepairFailed {
        /// Total debit amount after repair attempts.
        debit: Decimal,
        /// Total credit amount after repair attempts.
        credit: Decimal,
    },

    // ========== Fiscal Gating Errors ==========
    /// Entry date falls outside its fiscal year's range.
    #[error("Date {date} is outside fiscal year {year}")]
    DateOutsideYear {
        /// The offending date.
        date: NaiveDate,
        /// The fiscal year code.
        year: YearCode,
    },

    /// Fiscal year is closed, mutation refused.
    #[error("Fiscal year {0} is closed")]
    YearClosed(YearCode),

    /// Date falls inside a tax-regularization lock period.
    #[error("Date {0} falls inside a regularized period")]
    DateInLockedPeriod(NaiveDate),

    /// Entry is flagged non-editable.
    #[error("Entry {0} is not editable")]
    NotEditable(JournalEntryId),

    // ========== Referential Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Sub-account not found for the given code.
    #[error("Sub-account {code} not found in fiscal year {year}")]
    SubAccountNotFound {
        /// The sub-account code.
        code: String,
        /// The fiscal year code.
        year: YearCode,
    },

    // ========== Numbering Errors ==========
    /// Renumbering aborted for a fiscal year.
    #[error("Renumbering aborted for fiscal year {year}: {reason}")]
    RenumberAborted {
        /// The fiscal year whose renumbering failed.
        year: YearCode,
        /// Human-readable reason.
        reason: String,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for machine-readable reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::DebitAndCredit(_) => "DEBIT_AND_CREDIT",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::RepairFailed { .. } => "REPAIR_FAILED",
            Self::DateOutsideYear { .. } => "DATE_OUTSIDE_YEAR",
            Self::YearClosed(_) => "YEAR_CLOSED",
            Self::DateInLockedPeriod(_) => "DATE_IN_LOCKED_PERIOD",
            Self::NotEditable(_) => "NOT_EDITABLE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::SubAccountNotFound { .. } => "SUBACCOUNT_NOT_FOUND",
            Self::RenumberAborted { .. } => "RENUMBER_ABORTED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::EmptyEntry.error_code(), "EMPTY_ENTRY");
        assert_eq!(
            LedgerError::Unbalanced {
                debit: dec!(100),
                credit: dec!(50),
            }
            .error_code(),
            "UNBALANCED"
        );
        assert_eq!(
            LedgerError::YearClosed(YearCode::new("2026").unwrap()).error_code(),
            "YEAR_CLOSED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: dec!(100.00),
            credit: dec!(99.99),
        };
        assert_eq!(
            err.to_string(),
            "Entry is not balanced. Debit: 100.00, Credit: 99.99"
        );

        let err = LedgerError::DateOutsideYear {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            year: YearCode::new("2024").unwrap(),
        };
        assert_eq!(err.to_string(), "Date 2025-01-15 is outside fiscal year 2024");
    }
}
