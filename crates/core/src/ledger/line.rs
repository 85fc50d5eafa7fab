//! Ledger line domain type.

use balanz_shared::types::{JournalEntryId, LedgerLineId, SubAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::DocumentType;

/// A single debit/credit movement within a journal entry.
///
/// A line references exactly one sub-account and one journal entry, and is
/// mutated only through its owning entry. Either `debit` or `credit` carries
/// the movement; the other side stays zero. Amounts may be negative (a
/// negative debit is how reversals of debit movements are recorded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Unique identifier.
    pub id: LedgerLineId,
    /// The journal entry this line belongs to.
    pub entry_id: JournalEntryId,
    /// The sub-account this movement posts to.
    pub subaccount_id: SubAccountId,
    /// Denormalized sub-account code.
    pub subaccount_code: String,
    /// Counterpart sub-account, if tracked.
    pub counter_subaccount_id: Option<SubAccountId>,
    /// Denormalized counterpart sub-account code.
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

impl LedgerLine {
    /// Returns the signed movement: debit − credit.
    #[must_use]
    pub fn movement(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Validates that the line carries at most one side.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DebitAndCredit`] if both debit and credit are
    /// non-zero.
    pub fn check_sides(&self) -> Result<(), LedgerError> {
        if !self.debit.is_zero() && !self.credit.is_zero() {
            return Err(LedgerError::DebitAndCredit(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn make_line(debit: Decimal, credit: Decimal) -> LedgerLine {
        LedgerLine {
            id: LedgerLineId::new(),
            entry_id: JournalEntryId::new(),
            subaccount_id: SubAccountId::new(),
            subaccount_code: "4300000001".to_string(),
            counter_subaccount_id: None,
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

    #[test]
    fn test_movement_sign() {
        assert_eq!(make_line(dec!(100), dec!(0)).movement(), dec!(100));
        assert_eq!(make_line(dec!(0), dec!(40)).movement(), dec!(-40));
    }

    #[test]
    fn test_check_sides() {
        assert!(make_line(dec!(100), dec!(0)).check_sides().is_ok());
        assert!(make_line(dec!(0), dec!(100)).check_sides().is_ok());
        assert!(make_line(dec!(0), dec!(0)).check_sides().is_ok());
        assert!(matches!(
            make_line(dec!(100), dec!(50)).check_sides(),
            Err(LedgerError::DebitAndCredit(_))
        ));
    }

    #[test]
    fn test_negative_debit_is_legal() {
        let line = make_line(dec!(-25.50), dec!(0));
        assert!(line.check_sides().is_ok());
        assert_eq!(line.movement(), dec!(-25.50));
    }
}
