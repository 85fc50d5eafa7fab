//! Fiscal years and tax-regularization lock periods.
//!
//! A fiscal year bounds the dates of every journal entry and invoice posted
//! to it. Tax regularization periods are locked date intervals inside a year:
//! once a VAT regularization covers an interval, entries dated inside it can
//! no longer be freely edited or deleted.

pub mod error;
pub mod period;
pub mod year;

pub use error::FiscalError;
pub use period::{locked_period_for, PeriodCode, TaxRegularizationPeriod};
pub use year::{date_ranges_overlap, FiscalYear, YearStatus};
