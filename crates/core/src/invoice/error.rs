//! Error types for invoice operations.

use balanz_shared::types::{InvoiceId, YearCode};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Stored total does not match net + tax − withholding + surcharge.
    #[error("Invoice total mismatch: stored {stored}, computed {computed}")]
    TotalMismatch {
        /// Total stored on the header.
        stored: Decimal,
        /// Total recomputed from the amount fields.
        computed: Decimal,
    },

    /// Another invoice already holds the (year, series, number) triple.
    #[error("Invoice {series}{number} already exists in fiscal year {year}")]
    DuplicateKey {
        /// Fiscal year code.
        year: YearCode,
        /// Series code.
        series: String,
        /// Invoice number within the series.
        number: i64,
    },

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(InvoiceId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl InvoiceError {
    /// Returns the error code for machine-readable reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TotalMismatch { .. } => "TOTAL_MISMATCH",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = InvoiceError::TotalMismatch {
            stored: dec!(121.00),
            computed: dec!(111.00),
        };
        assert_eq!(
            err.to_string(),
            "Invoice total mismatch: stored 121.00, computed 111.00"
        );
        assert_eq!(err.error_code(), "TOTAL_MISMATCH");
    }

    #[test]
    fn test_duplicate_key_display() {
        let err = InvoiceError::DuplicateKey {
            year: YearCode::new("2024").unwrap(),
            series: "A".to_string(),
            number: 17,
        };
        assert_eq!(err.to_string(), "Invoice A17 already exists in fiscal year 2024");
    }
}
