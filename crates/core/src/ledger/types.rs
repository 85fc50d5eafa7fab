//! Ledger domain types for entry creation and validation.

use balanz_shared::types::{amount::round_amount, YearCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of source document a journal entry or ledger line points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Customer (sales) invoice.
    CustomerInvoice,
    /// Supplier (purchase) invoice.
    SupplierInvoice,
}

impl DocumentType {
    /// Returns the canonical storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomerInvoice => "customer_invoice",
            Self::SupplierInvoice => "supplier_invoice",
        }
    }

    /// Parses a canonical storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer_invoice" => Some(Self::CustomerInvoice),
            "supplier_invoice" => Some(Self::SupplierInvoice),
            _ => None,
        }
    }
}

/// Debit and credit totals of a journal entry, at amount precision.
///
/// Totals are rounded to two decimals on construction; an entry is balanced
/// when the rounded totals are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Whether the rounded totals are equal.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates entry totals from raw debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        let debit = round_amount(debit);
        let credit = round_amount(credit);
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns the entry amount: max(|debit|, |credit|).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit.abs().max(self.credit.abs())
    }
}

/// Input for a single ledger line of a new journal entry.
///
/// Sub-accounts are referenced by code; the persistence layer resolves codes
/// to IDs within the entry's fiscal year.
#[derive(Debug, Clone)]
pub struct NewLedgerLine {
    /// Code of the sub-account to post to.
    pub subaccount_code: String,
    /// Code of the counterpart sub-account, if tracked.
    pub counter_subaccount_code: Option<String>,
    /// Debit amount (zero if this is a credit movement).
    pub debit: Decimal,
    /// Credit amount (zero if this is a debit movement).
    pub credit: Decimal,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// Conversion rate to the company currency.
    pub conversion_rate: Decimal,
    /// Kind of source document this line belongs to, if any.
    pub document_type: Option<DocumentType>,
    /// Code of the source document, if any.
    pub document_code: Option<String>,
    /// Tax identifier of the counterparty, if relevant.
    pub tax_id: Option<String>,
    /// VAT base amount for tax reporting.
    pub vat_base: Decimal,
    /// VAT rate applied, percent.
    pub vat_rate: Decimal,
    /// Equivalence surcharge rate applied, percent.
    pub surcharge_rate: Decimal,
}

impl NewLedgerLine {
    /// Creates a plain movement line with no document linkage.
    #[must_use]
    pub fn movement(subaccount_code: impl Into<String>, debit: Decimal, credit: Decimal) -> Self {
        Self {
            subaccount_code: subaccount_code.into(),
            counter_subaccount_code: None,
            debit,
            credit,
            currency: "EUR".to_string(),
            conversion_rate: Decimal::ONE,
            document_type: None,
            document_code: None,
            tax_id: None,
            vat_base: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            surcharge_rate: Decimal::ZERO,
        }
    }
}

/// Input for creating a new journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    /// Fiscal year the entry posts to.
    pub year_code: YearCode,
    /// Accounting date.
    pub date: NaiveDate,
    /// Concept text describing the operation.
    pub concept: String,
    /// Kind of source document, if the entry posts one.
    pub document_type: Option<DocumentType>,
    /// Code of the source document, if any.
    pub document_code: Option<String>,
    /// The ledger lines (at least one, balanced).
    pub lines: Vec<NewLedgerLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_balanced() {
        let totals = EntryTotals::new(dec!(100.00), dec!(100.00));
        assert!(totals.is_balanced);
        assert_eq!(totals.difference(), Decimal::ZERO);
        assert_eq!(totals.amount(), dec!(100.00));
    }

    #[test]
    fn test_totals_unbalanced_by_one_cent() {
        let totals = EntryTotals::new(dec!(100.00), dec!(99.99));
        assert!(!totals.is_balanced);
        assert_eq!(totals.difference(), dec!(0.01));
    }

    #[test]
    fn test_totals_sub_cent_drift_rounds_away() {
        // 100.004 and 100.001 both round to 100.00 at amount precision.
        let totals = EntryTotals::new(dec!(100.004), dec!(100.001));
        assert!(totals.is_balanced);
        assert_eq!(totals.amount(), dec!(100.00));
    }

    #[test]
    fn test_totals_amount_uses_larger_side() {
        let totals = EntryTotals::new(dec!(50.00), dec!(120.00));
        assert_eq!(totals.amount(), dec!(120.00));
    }

    #[test]
    fn test_document_type_roundtrip() {
        for dt in [DocumentType::CustomerInvoice, DocumentType::SupplierInvoice] {
            assert_eq!(DocumentType::parse(dt.as_str()), Some(dt));
        }
        assert_eq!(DocumentType::parse("delivery_note"), None);
    }
}
