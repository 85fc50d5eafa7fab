//! Fiscal year definition and date-range rules.

use balanz_shared::types::{CompanyId, JournalEntryId, YearCode};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::FiscalError;

/// Status of a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearStatus {
    /// Year is open for posting.
    Open,
    /// Year is closed; entries are immutable except the year-end entries.
    Closed,
}

/// A fiscal year: the date range bounding entries and invoices.
///
/// Keyed by a short alphanumeric [`YearCode`] rather than a UUID; the code
/// travels denormalized on journal entries and invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Short alphanumeric code (natural key, e.g. "2026").
    pub code: YearCode,
    /// Company this fiscal year belongs to.
    pub company_id: CompanyId,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: YearStatus,
    /// Opening entry generated at year start, if any.
    pub opening_entry_id: Option<JournalEntryId>,
    /// Closing entry generated at year end, if any.
    pub closing_entry_id: Option<JournalEntryId>,
    /// Profit-and-loss entry generated at year end, if any.
    pub profit_loss_entry_id: Option<JournalEntryId>,
    /// Length of sub-account codes within this year.
    pub subaccount_code_length: u8,
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if:
/// a_start <= b_end AND a_end >= b_start
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

impl FiscalYear {
    /// Default sub-account code length.
    pub const DEFAULT_SUBACCOUNT_CODE_LENGTH: u8 = 10;

    /// Creates a fiscal year after validating its date range.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalError::InvalidDateRange`] if `start_date > end_date`.
    pub fn new(
        code: YearCode,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, FiscalError> {
        if start_date > end_date {
            return Err(FiscalError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            code,
            company_id,
            start_date,
            end_date,
            status: YearStatus::Open,
            opening_entry_id: None,
            closing_entry_id: None,
            profit_loss_entry_id: None,
            subaccount_code_length: Self::DEFAULT_SUBACCOUNT_CODE_LENGTH,
        })
    }

    /// Synthesizes the calendar year containing `date`.
    ///
    /// Used when a transaction is dated outside every existing fiscal year
    /// and auto-creation is allowed.
    #[must_use]
    pub fn from_date(company_id: CompanyId, date: NaiveDate) -> Self {
        let year = date.year();
        Self {
            code: YearCode::from_year(year),
            company_id,
            start_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(date),
            end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(date),
            status: YearStatus::Open,
            opening_entry_id: None,
            closing_entry_id: None,
            profit_loss_entry_id: None,
            subaccount_code_length: Self::DEFAULT_SUBACCOUNT_CODE_LENGTH,
        }
    }

    /// Returns true if the year is open for posting.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == YearStatus::Open
    }

    /// Returns true if the given date falls within this year.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if this year's range overlaps the other's.
    ///
    /// Only years of the same company compete for a date range.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.company_id == other.company_id
            && date_ranges_overlap(
                self.start_date,
                self.end_date,
                other.start_date,
                other.end_date,
            )
    }

    /// Validates this year against the company's existing years.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalError::OverlappingYear`] naming the first year whose
    /// range collides with this one.
    pub fn check_no_overlap<'a, I>(&self, existing: I) -> Result<(), FiscalError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        for other in existing {
            if other.code != self.code && self.overlaps(other) {
                return Err(FiscalError::OverlappingYear {
                    candidate: self.code.clone(),
                    existing: other.code.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns true if the entry is one of the year's designated system
    /// entries (opening, closing, or profit-and-loss).
    ///
    /// System entries stay mutable after the year closes and are exempt from
    /// regularization locks.
    #[must_use]
    pub fn is_system_entry(&self, entry_id: JournalEntryId) -> bool {
        self.opening_entry_id == Some(entry_id)
            || self.closing_entry_id == Some(entry_id)
            || self.profit_loss_entry_id == Some(entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(code: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> FiscalYear {
        FiscalYear::new(
            YearCode::new(code).unwrap(),
            CompanyId::from_uuid(uuid::Uuid::nil()),
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let result = FiscalYear::new(
            YearCode::new("2026").unwrap(),
            CompanyId::new(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        );
        assert!(matches!(result, Err(FiscalError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_from_date_spans_calendar_year() {
        let fy = FiscalYear::from_date(
            CompanyId::new(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        );
        assert_eq!(fy.code.as_str(), "2024");
        assert_eq!(fy.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(fy.end_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(fy.is_open());
    }

    #[test]
    fn test_contains() {
        let fy = year("2024", (2024, 1, 1), (2024, 12, 31));
        assert!(fy.contains(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()));
        assert!(fy.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(fy.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!fy.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }

    #[test]
    fn test_overlapping_years_rejected() {
        let a = year("2024", (2024, 1, 1), (2024, 12, 31));
        let b = year("24B", (2024, 6, 1), (2025, 5, 31));
        assert!(a.overlaps(&b));
        assert!(matches!(
            b.check_no_overlap([&a]),
            Err(FiscalError::OverlappingYear { .. })
        ));
    }

    #[test]
    fn test_adjacent_years_allowed() {
        let a = year("2024", (2024, 1, 1), (2024, 12, 31));
        let b = year("2025", (2025, 1, 1), (2025, 12, 31));
        assert!(!a.overlaps(&b));
        assert!(b.check_no_overlap([&a]).is_ok());
    }

    #[test]
    fn test_overlap_ignores_other_companies() {
        let a = year("2024", (2024, 1, 1), (2024, 12, 31));
        let mut b = year("24B", (2024, 1, 1), (2024, 12, 31));
        b.company_id = CompanyId::new();
        assert!(!a.overlaps(&b));
        assert!(b.check_no_overlap([&a]).is_ok());
    }

    #[test]
    fn test_system_entry_designation() {
        let mut fy = year("2024", (2024, 1, 1), (2024, 12, 31));
        let opening = JournalEntryId::new();
        let other = JournalEntryId::new();
        fy.opening_entry_id = Some(opening);
        assert!(fy.is_system_entry(opening));
        assert!(!fy.is_system_entry(other));
    }
}
