//! Payment receipts.
//!
//! A receipt is one installment of an invoice's total. Receipts do not
//! recompute the invoice's paid/pending aggregate themselves: every receipt
//! mutation notifies a [`ReceiptGenerator`] collaborator, which owns that
//! logic (and the regeneration of receipts when payment terms change).

use balanz_shared::types::{amount, InvoiceId, ReceiptId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::Invoice;

/// One installment of an invoice's total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique identifier.
    pub id: ReceiptId,
    /// The invoice this receipt belongs to.
    pub invoice_id: InvoiceId,
    /// Sequence number within the invoice (1-based).
    pub number: i32,
    /// Installment amount.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Whether the installment has been paid.
    pub paid: bool,
    /// Date the installment was paid, when `paid`.
    pub paid_date: Option<NaiveDate>,
}

impl Receipt {
    /// Returns true if the receipt is unpaid and past due.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.paid && self.due_date < today
    }

    /// Marks the receipt paid on the given date.
    pub fn mark_paid(&mut self, date: NaiveDate) {
        self.paid = true;
        self.paid_date = Some(date);
    }

    /// Reopens a paid receipt.
    pub fn reopen(&mut self) {
        self.paid = false;
        self.paid_date = None;
    }
}

/// Returns true if the receipts' amounts add up to the invoice total.
///
/// Checked at amount tolerance; the generator is responsible for keeping the
/// installments reconciled when it regenerates them.
#[must_use]
pub fn receipts_reconcile(invoice_total: Decimal, receipts: &[Receipt]) -> bool {
    let sum: Decimal = receipts.iter().map(|r| r.amount).sum();
    amount::within_tolerance(
        amount::round_amount(sum),
        invoice_total,
        amount::BALANCE_TOLERANCE,
    )
}

/// Collaborator recomputing an invoice's paid/pending aggregate.
///
/// Implementations look at the invoice's receipts and update the header's
/// paid flag (and any payment-history records) accordingly. Called after
/// every receipt save or delete.
pub trait ReceiptGenerator {
    /// Refreshes the invoice's aggregate payment state from its receipts.
    fn update(&self, invoice: &mut Invoice, receipts: &[Receipt]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::types::tests::make_invoice;
    use rust_decimal_macros::dec;

    fn make_receipt(number: i32, amount: Decimal) -> Receipt {
        Receipt {
            id: ReceiptId::new(),
            invoice_id: InvoiceId::new(),
            number,
            amount,
            due_date: NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
            paid: false,
            paid_date: None,
        }
    }

    #[test]
    fn test_overdue() {
        let receipt = make_receipt(1, dec!(60.50));
        assert!(receipt.is_overdue(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()));
        assert!(!receipt.is_overdue(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));

        let mut paid = make_receipt(1, dec!(60.50));
        paid.mark_paid(NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
        assert!(!paid.is_overdue(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()));
    }

    #[test]
    fn test_mark_paid_and_reopen() {
        let mut receipt = make_receipt(1, dec!(60.50));
        let date = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
        receipt.mark_paid(date);
        assert!(receipt.paid);
        assert_eq!(receipt.paid_date, Some(date));
        receipt.reopen();
        assert!(!receipt.paid);
        assert_eq!(receipt.paid_date, None);
    }

    #[test]
    fn test_receipts_reconcile() {
        let receipts = vec![make_receipt(1, dec!(60.50)), make_receipt(2, dec!(60.50))];
        assert!(receipts_reconcile(dec!(121.00), &receipts));
        assert!(!receipts_reconcile(dec!(130.00), &receipts));
    }

    #[test]
    fn test_generator_is_notified_shape() {
        // A minimal generator marking the invoice paid when all receipts are.
        struct AllPaid;
        impl ReceiptGenerator for AllPaid {
            fn update(&self, invoice: &mut Invoice, receipts: &[Receipt]) {
                invoice.paid = !receipts.is_empty() && receipts.iter().all(|r| r.paid);
            }
        }

        let mut invoice = make_invoice();
        let mut receipts = vec![make_receipt(1, dec!(121.00))];
        AllPaid.update(&mut invoice, &receipts);
        assert!(!invoice.paid);

        receipts[0].mark_paid(NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
        AllPaid.update(&mut invoice, &receipts);
        assert!(invoice.paid);
    }
}
