//! Tax regularization periods.
//!
//! A VAT regularization covers a date interval of a fiscal year and locks it:
//! entries dated inside a regularized interval can no longer be edited or
//! deleted, except the year's designated system entries.

use balanz_shared::types::{SubAccountId, TaxPeriodId, YearCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::year::date_ranges_overlap;

/// Which slice of the fiscal year a regularization covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodCode {
    /// First quarter.
    Q1,
    /// Second quarter.
    Q2,
    /// Third quarter.
    Q3,
    /// Fourth quarter.
    Q4,
    /// A single month (1-12).
    Month(u8),
    /// The whole fiscal year.
    FullYear,
}

impl PeriodCode {
    /// Parses a canonical storage string ("Q1".."Q4", "M01".."M12", "Y").
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            "Y" => Some(Self::FullYear),
            _ => {
                let month = s.strip_prefix('M')?.parse::<u8>().ok()?;
                (1..=12).contains(&month).then_some(Self::Month(month))
            }
        }
    }
}

impl std::fmt::Display for PeriodCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Q1 => write!(f, "Q1"),
            Self::Q2 => write!(f, "Q2"),
            Self::Q3 => write!(f, "Q3"),
            Self::Q4 => write!(f, "Q4"),
            Self::Month(m) => write!(f, "M{m:02}"),
            Self::FullYear => write!(f, "Y"),
        }
    }
}

/// A locked date interval of a fiscal year, created by a VAT regularization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRegularizationPeriod {
    /// Unique identifier.
    pub id: TaxPeriodId,
    /// Fiscal year this period belongs to.
    pub year_code: YearCode,
    /// Which slice of the year is covered.
    pub period: PeriodCode,
    /// First locked day.
    pub start_date: NaiveDate,
    /// Last locked day (inclusive).
    pub end_date: NaiveDate,
    /// Sub-account the creditor VAT balance was regularized into.
    pub creditor_subaccount_id: Option<SubAccountId>,
    /// Sub-account the debtor VAT balance was regularized into.
    pub debtor_subaccount_id: Option<SubAccountId>,
}

impl TaxRegularizationPeriod {
    /// Returns true if the given date falls inside the locked interval.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if this period's interval overlaps the other's.
    ///
    /// Overlapping periods within a year are tolerated at save time (a
    /// correction may re-regularize part of an interval); callers use this
    /// to warn, not to reject.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.year_code == other.year_code
            && date_ranges_overlap(
                self.start_date,
                self.end_date,
                other.start_date,
                other.end_date,
            )
    }
}

/// Finds the first regularization period locking the given date, if any.
#[must_use]
pub fn locked_period_for<'a>(
    periods: &'a [TaxRegularizationPeriod],
    date: NaiveDate,
) -> Option<&'a TaxRegularizationPeriod> {
    periods.iter().find(|p| p.contains(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> TaxRegularizationPeriod {
        TaxRegularizationPeriod {
            id: TaxPeriodId::new(),
            year_code: YearCode::new("2024").unwrap(),
            period: PeriodCode::Q2,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            creditor_subaccount_id: None,
            debtor_subaccount_id: None,
        }
    }

    #[rstest]
    #[case(PeriodCode::Q1, "Q1")]
    #[case(PeriodCode::Q4, "Q4")]
    #[case(PeriodCode::Month(1), "M01")]
    #[case(PeriodCode::Month(12), "M12")]
    #[case(PeriodCode::FullYear, "Y")]
    fn test_period_code_roundtrip(#[case] code: PeriodCode, #[case] s: &str) {
        assert_eq!(code.to_string(), s);
        assert_eq!(PeriodCode::parse(s), Some(code));
    }

    #[test]
    fn test_period_code_parse_invalid() {
        assert_eq!(PeriodCode::parse("M13"), None);
        assert_eq!(PeriodCode::parse("M00"), None);
        assert_eq!(PeriodCode::parse("Q5"), None);
        assert_eq!(PeriodCode::parse(""), None);
    }

    #[test]
    fn test_contains() {
        let p = period((2024, 4, 1), (2024, 6, 30));
        assert!(p.contains(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()));
        assert!(p.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
        assert!(p.contains(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }

    #[test]
    fn test_locked_period_for() {
        let periods = vec![
            period((2024, 1, 1), (2024, 3, 31)),
            period((2024, 4, 1), (2024, 6, 30)),
        ];
        let hit = locked_period_for(&periods, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert!(hit.is_some());
        assert!(locked_period_for(&periods, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()).is_none());
    }

    #[test]
    fn test_overlap_tolerated_but_detectable() {
        let a = period((2024, 1, 1), (2024, 3, 31));
        let b = period((2024, 3, 1), (2024, 6, 30));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let mut c = period((2024, 4, 1), (2024, 6, 30));
        c.year_code = YearCode::new("2025").unwrap();
        assert!(!a.overlaps(&c));
    }
}
