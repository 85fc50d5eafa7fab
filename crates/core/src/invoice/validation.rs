//! Save-time validation for invoice headers.

use balanz_shared::types::amount::{within_tolerance, BALANCE_TOLERANCE};

use super::error::InvoiceError;
use super::types::Invoice;

/// Validates the totals identity of an invoice header.
///
/// total = net + tax − withholding + surcharge, within amount tolerance.
///
/// # Errors
///
/// Returns [`InvoiceError::TotalMismatch`] naming both amounts.
pub fn check_totals(invoice: &Invoice) -> Result<(), InvoiceError> {
    let computed = invoice.computed_total();
    if !within_tolerance(invoice.total, computed, BALANCE_TOLERANCE) {
        return Err(InvoiceError::TotalMismatch {
            stored: invoice.total,
            computed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::types::tests::make_invoice;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_totals() {
        // total 121 = net 100 + tax 21.
        let invoice = make_invoice();
        assert!(check_totals(&invoice).is_ok());
    }

    #[test]
    fn test_net_change_without_total_update_fails() {
        let mut invoice = make_invoice();
        invoice.net = dec!(90.00);
        assert!(matches!(
            check_totals(&invoice),
            Err(InvoiceError::TotalMismatch { .. })
        ));
    }

    #[test]
    fn test_withholding_subtracts() {
        let mut invoice = make_invoice();
        invoice.withholding = dec!(15.00);
        invoice.total = dec!(106.00);
        assert!(check_totals(&invoice).is_ok());
    }

    #[test]
    fn test_cent_drift_tolerated() {
        let mut invoice = make_invoice();
        invoice.total = dec!(121.01);
        assert!(check_totals(&invoice).is_ok());
        invoice.total = dec!(121.02);
        assert!(check_totals(&invoice).is_err());
    }
}
