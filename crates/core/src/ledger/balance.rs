//! Sub-account running totals.
//!
//! Every ledger-line mutation recomputes the owning sub-account's cached
//! debit/credit/balance totals synchronously, so the cache never drifts from
//! the lines.

use balanz_shared::types::{amount::round_amount, SubAccountId, YearCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cached debit/credit/balance totals of a sub-account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccountTotals {
    /// Total debit over the sub-account's lines.
    pub debit: Decimal,
    /// Total credit over the sub-account's lines.
    pub credit: Decimal,
    /// Net balance: debit − credit.
    pub balance: Decimal,
}

impl SubAccountTotals {
    /// Zeroed totals for a fresh sub-account.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Recomputes totals from (debit, credit) pairs of the lines.
    ///
    /// Sums are taken at full precision and rounded to amount precision.
    #[must_use]
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;
        for (d, c) in lines {
            debit += d;
            credit += c;
        }
        let debit = round_amount(debit);
        let credit = round_amount(credit);
        Self {
            debit,
            credit,
            balance: debit - credit,
        }
    }

    /// Returns true if all totals are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }
}

/// The finest-grained ledger account, scoped to one fiscal year.
///
/// Created on demand when an entity needs a year-specific account; lives for
/// the life of the fiscal year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAccount {
    /// Unique identifier.
    pub id: SubAccountId,
    /// Human code, unique within the fiscal year.
    pub code: String,
    /// Fiscal year this sub-account belongs to.
    pub year_code: YearCode,
    /// Code of the parent account.
    pub account_code: String,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// Tax code, for VAT sub-accounts.
    pub tax_code: Option<String>,
    /// Cached totals over the sub-account's lines.
    pub totals: SubAccountTotals,
}

impl SubAccount {
    /// Creates a sub-account with zeroed totals.
    #[must_use]
    pub fn new(code: impl Into<String>, year_code: YearCode, account_code: impl Into<String>) -> Self {
        Self {
            id: SubAccountId::new(),
            code: code.into(),
            year_code,
            account_code: account_code.into(),
            currency: "EUR".to_string(),
            tax_code: None,
            totals: SubAccountTotals::zero(),
        }
    }

    /// Replaces the cached totals with a recomputation over the lines.
    ///
    /// Returns true if the cache changed.
    pub fn recompute<I>(&mut self, lines: I) -> bool
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let totals = SubAccountTotals::from_lines(lines);
        if totals == self.totals {
            false
        } else {
            self.totals = totals;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn subaccount() -> SubAccount {
        SubAccount::new("4300000001", YearCode::new("2024").unwrap(), "430")
    }

    #[test]
    fn test_zero_totals() {
        let totals = SubAccountTotals::zero();
        assert!(totals.is_zero());
        assert_eq!(totals.balance, Decimal::ZERO);
    }

    #[test]
    fn test_from_lines() {
        let totals = SubAccountTotals::from_lines(vec![
            (dec!(100), dec!(0)),
            (dec!(50), dec!(0)),
            (dec!(0), dec!(30)),
        ]);
        assert_eq!(totals.debit, dec!(150.00));
        assert_eq!(totals.credit, dec!(30.00));
        assert_eq!(totals.balance, dec!(120.00));
    }

    #[test]
    fn test_balance_equals_sum_of_movements() {
        let lines = vec![(dec!(10.50), dec!(0)), (dec!(0), dec!(4.25)), (dec!(1), dec!(0))];
        let totals = SubAccountTotals::from_lines(lines.clone());
        let movements: Decimal = lines.iter().map(|(d, c)| d - c).sum();
        assert_eq!(totals.balance, movements);
    }

    #[test]
    fn test_recompute_reports_change() {
        let mut sub = subaccount();
        assert!(sub.recompute(vec![(dec!(100), dec!(0))]));
        assert_eq!(sub.totals.balance, dec!(100.00));
        // Same lines, no change.
        assert!(!sub.recompute(vec![(dec!(100), dec!(0))]));
        // Line removed, totals go back to zero.
        assert!(sub.recompute(Vec::new()));
        assert!(sub.totals.is_zero());
    }
}
