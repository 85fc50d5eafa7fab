//! Monetary amount helpers with fixed decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` rounded to [`AMOUNT_SCALE`]
//! decimal places with Banker's Rounding.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Number of decimal places amounts are stored and compared at.
pub const AMOUNT_SCALE: u32 = 2;

/// Maximum |debit − credit| difference for an entry to count as balanced.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Tolerance when comparing a posting entry's amount against its source
/// invoice total (looser than the balance tolerance to absorb per-line
/// rounding on both sides).
pub const ENTRY_AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(2, 0, 0, false, 2); // 0.02

/// Rounds a monetary value to [`AMOUNT_SCALE`] decimals using Banker's
/// Rounding (`MidpointNearestEven`).
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if two amounts are equal within the given tolerance.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_constants() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
        assert_eq!(ENTRY_AMOUNT_TOLERANCE, dec!(0.02));
    }

    #[rstest]
    #[case(dec!(1.005), dec!(1.00))] // midpoint rounds to even
    #[case(dec!(1.015), dec!(1.02))]
    #[case(dec!(1.004), dec!(1.00))]
    #[case(dec!(1.006), dec!(1.01))]
    #[case(dec!(-1.005), dec!(-1.00))]
    fn test_round_amount(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(dec!(100.00), dec!(100.01), BALANCE_TOLERANCE));
        assert!(within_tolerance(dec!(100.01), dec!(100.00), BALANCE_TOLERANCE));
        assert!(!within_tolerance(dec!(100.00), dec!(100.02), BALANCE_TOLERANCE));
        assert!(within_tolerance(dec!(100.00), dec!(100.02), ENTRY_AMOUNT_TOLERANCE));
    }
}
