//! Error types for fiscal year and period operations.

use balanz_shared::types::YearCode;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during fiscal year and period operations.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Start date must not be after end date.
    #[error("Start date {start} must not be after end date {end}")]
    InvalidDateRange {
        /// Start of the range.
        start: NaiveDate,
        /// End of the range.
        end: NaiveDate,
    },

    /// Fiscal year code failed validation.
    #[error("Invalid fiscal year code: {0}")]
    InvalidYearCode(String),

    /// Fiscal year date range overlaps an existing year of the same company.
    #[error("Fiscal year {candidate} overlaps existing fiscal year {existing}")]
    OverlappingYear {
        /// Code of the year being created.
        candidate: YearCode,
        /// Code of the year it collides with.
        existing: YearCode,
    },

    /// No fiscal year contains the given date.
    #[error("No fiscal year contains date {0}")]
    NoYearForDate(NaiveDate),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    YearNotFound(YearCode),

    /// Fiscal year is closed and refuses the mutation.
    #[error("Fiscal year {0} is closed")]
    YearClosed(YearCode),
}

impl FiscalError {
    /// Returns the error code for machine-readable reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidYearCode(_) => "INVALID_YEAR_CODE",
            Self::OverlappingYear { .. } => "OVERLAPPING_YEAR",
            Self::NoYearForDate(_) => "NO_YEAR_FOR_DATE",
            Self::YearNotFound(_) => "YEAR_NOT_FOUND",
            Self::YearClosed(_) => "YEAR_CLOSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FiscalError::YearClosed(YearCode::new("2026").unwrap());
        assert_eq!(err.to_string(), "Fiscal year 2026 is closed");
        assert_eq!(err.error_code(), "YEAR_CLOSED");
    }

    #[test]
    fn test_overlap_display() {
        let err = FiscalError::OverlappingYear {
            candidate: YearCode::new("26B").unwrap(),
            existing: YearCode::new("2026").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Fiscal year 26B overlaps existing fiscal year 2026"
        );
    }
}
