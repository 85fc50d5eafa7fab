//! Invoice domain types.

use balanz_shared::types::{amount::round_amount, InvoiceId, JournalEntryId, YearCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::DocumentType;

/// An invoice header (customer or supplier side).
///
/// Identified for display by the (year, series, number) triple, which is
/// unique together. The amounts breakdown must satisfy
/// total = net + tax − withholding + surcharge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,
    /// Customer or supplier invoice.
    pub kind: DocumentType,
    /// Fiscal year the invoice belongs to.
    pub year_code: YearCode,
    /// Series code (e.g. "A").
    pub series: String,
    /// Number within the series.
    pub number: i64,
    /// Code of the customer or supplier.
    pub party_code: String,
    /// Code of the sales agent, if any.
    pub agent_code: Option<String>,
    /// Free-form observations.
    pub notes: String,
    /// Invoice date.
    pub date: NaiveDate,
    /// Net amount before taxes.
    pub net: Decimal,
    /// VAT amount.
    pub tax: Decimal,
    /// Withholding (IRPF) amount, subtracted from the total.
    pub withholding: Decimal,
    /// Equivalence surcharge amount.
    pub surcharge: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// Journal entry that posted this invoice, if generated.
    pub entry_id: Option<JournalEntryId>,
    /// Journal entry that recorded the payment, if generated.
    pub payment_entry_id: Option<JournalEntryId>,
    /// Whether the invoice is fully paid.
    pub paid: bool,
    /// Whether the invoice is voided.
    pub voided: bool,
    /// Invoice this one rectifies, if any.
    pub rectifies: Option<InvoiceId>,
}

impl Invoice {
    /// Returns the display code built from the (year, series, number) triple.
    #[must_use]
    pub fn code(&self) -> String {
        format!("{}{}{:06}", self.year_code, self.series, self.number)
    }

    /// Recomputes the total from the amount fields.
    #[must_use]
    pub fn computed_total(&self) -> Decimal {
        round_amount(self.net + self.tax - self.withholding + self.surcharge)
    }

    /// The amount the posting journal entry is expected to carry.
    ///
    /// Withholding is added back: the entry posts the gross movement and the
    /// withholding goes to its own sub-account line.
    #[must_use]
    pub fn expected_entry_amount(&self) -> Decimal {
        round_amount(self.total + self.withholding)
    }
}

/// One line of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Product reference, if the line sells a catalogued product.
    pub reference: Option<String>,
    /// Line description.
    pub description: String,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Net amount of the line (quantity × price − discount).
    pub net: Decimal,
    /// VAT rate applied, percent.
    pub vat_rate: Decimal,
    /// Equivalence surcharge rate applied, percent.
    pub surcharge_rate: Decimal,
    /// Withholding rate applied, percent.
    pub withholding_rate: Decimal,
}

/// Amounts breakdown recomputed from invoice lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Net amount before taxes.
    pub net: Decimal,
    /// VAT amount.
    pub tax: Decimal,
    /// Withholding amount.
    pub withholding: Decimal,
    /// Equivalence surcharge amount.
    pub surcharge: Decimal,
}

impl InvoiceTotals {
    /// Recomputes the breakdown from the lines.
    ///
    /// Component sums are taken at full precision and rounded once at the
    /// end, so per-line drift cancels out.
    #[must_use]
    pub fn from_lines(lines: &[InvoiceLine]) -> Self {
        let hundred = Decimal::ONE_HUNDRED;
        let mut net = Decimal::ZERO;
        let mut tax = Decimal::ZERO;
        let mut withholding = Decimal::ZERO;
        let mut surcharge = Decimal::ZERO;

        for line in lines {
            net += line.net;
            tax += line.net * line.vat_rate / hundred;
            surcharge += line.net * line.surcharge_rate / hundred;
            withholding += line.net * line.withholding_rate / hundred;
        }

        Self {
            net: round_amount(net),
            tax: round_amount(tax),
            withholding: round_amount(withholding),
            surcharge: round_amount(surcharge),
        }
    }

    /// Returns the grand total of this breakdown.
    #[must_use]
    pub fn total(&self) -> Decimal {
        round_amount(self.net + self.tax - self.withholding + self.surcharge)
    }
}
