//! Journal entry aggregate.

use balanz_shared::types::{JournalEntryId, YearCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line::LedgerLine;
use super::types::{DocumentType, EntryTotals};
use super::validation::entry_totals;

/// A numbered, balanced accounting transaction.
///
/// Entries are numbered sequentially within their fiscal year. The `amount`
/// header field caches max(|Σdebit|, |Σcredit|) of the lines and is refreshed
/// whenever the lines change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Sequential number, unique within the fiscal year.
    pub number: i64,
    /// Fiscal year the entry posts to.
    pub year_code: YearCode,
    /// Accounting date.
    pub date: NaiveDate,
    /// Concept text describing the operation.
    pub concept: String,
    /// Whether the entry may be edited (system entries are flagged false).
    pub editable: bool,
    /// Kind of source document, if the entry posts one.
    pub document_type: Option<DocumentType>,
    /// Code of the source document, if any.
    pub document_code: Option<String>,
    /// Cached amount: max(|Σdebit|, |Σcredit|) of the lines.
    pub amount: Decimal,
    /// Ledger lines (populated when needed).
    #[serde(default)]
    pub lines: Vec<LedgerLine>,
}

impl JournalEntry {
    /// Recomputes debit/credit totals from the lines.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        entry_totals(&self.lines)
    }

    /// Returns true if the rounded line totals are equal.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.totals().is_balanced
    }

    /// Refreshes the cached amount from the lines; returns true if it changed.
    pub fn refresh_amount(&mut self) -> bool {
        let computed = self.totals().amount();
        if self.amount == computed {
            false
        } else {
            self.amount = computed;
            true
        }
    }

    /// Returns true if the entry posts the given document.
    #[must_use]
    pub fn posts_document(&self, document_type: DocumentType, document_code: &str) -> bool {
        self.document_type == Some(document_type)
            && self.document_code.as_deref() == Some(document_code)
    }
}
