//! Full integrity audit for invoices.
//!
//! A secondary, more expensive consistency pass, distinct from save-time
//! validation: it recomputes the amounts breakdown from the lines, verifies
//! the posting-entry linkage, and flags heuristic duplicates. Findings are
//! reported, never auto-corrected — except a dangling posting-entry
//! reference, which the caller clears and re-saves.

use balanz_shared::types::{amount, InvoiceId, JournalEntryId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::JournalEntry;

use super::types::{Invoice, InvoiceLine, InvoiceTotals};

/// Header amount field an audit finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalField {
    /// Net amount.
    Net,
    /// VAT amount.
    Tax,
    /// Withholding amount.
    Withholding,
    /// Surcharge amount.
    Surcharge,
    /// Grand total.
    Total,
}

/// One inconsistency found by the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditFinding {
    /// A stored header amount disagrees with the recomputation from lines.
    HeaderTotalMismatch {
        /// Which field disagrees.
        field: TotalField,
        /// Amount stored on the header.
        stored: Decimal,
        /// Amount recomputed from the lines.
        computed: Decimal,
    },
    /// The posting entry reference points at a missing entry.
    ///
    /// The only finding corrected in place: the caller clears the reference
    /// and re-saves the invoice.
    DanglingEntryReference {
        /// The missing entry.
        entry_id: JournalEntryId,
    },
    /// The posting entry does not reference this invoice as its document.
    EntryDocumentMismatch {
        /// The linked entry.
        entry_id: JournalEntryId,
    },
    /// The posting entry's amount disagrees with the invoice total
    /// (adjusted for withholding).
    EntryAmountMismatch {
        /// Amount carried by the entry.
        entry_amount: Decimal,
        /// Amount the invoice expects.
        expected: Decimal,
    },
    /// Another invoice looks like a duplicate of this one.
    PossibleDuplicate {
        /// The suspected duplicate.
        other: InvoiceId,
        /// Whether the line references also match.
        identical_lines: bool,
    },
}

impl std::fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderTotalMismatch {
                field,
                stored,
                computed,
            } => write!(
                f,
                "Header {field:?} mismatch: stored {stored}, computed {computed}"
            ),
            Self::DanglingEntryReference { entry_id } => {
                write!(f, "Posting entry {entry_id} no longer exists")
            }
            Self::EntryDocumentMismatch { entry_id } => {
                write!(f, "Posting entry {entry_id} references another document")
            }
            Self::EntryAmountMismatch {
                entry_amount,
                expected,
            } => write!(
                f,
                "Posting entry amount {entry_amount} differs from expected {expected}"
            ),
            Self::PossibleDuplicate {
                other,
                identical_lines,
            } => {
                if *identical_lines {
                    write!(f, "Possible duplicate of invoice {other} (identical lines)")
                } else {
                    write!(f, "Possible duplicate of invoice {other}")
                }
            }
        }
    }
}

/// Header data of a same-date invoice, checked by the duplicate heuristic.
#[derive(Debug, Clone)]
pub struct DuplicateCandidate {
    /// The candidate invoice.
    pub id: InvoiceId,
    /// Its date.
    pub date: NaiveDate,
    /// Its customer/supplier code.
    pub party_code: String,
    /// Its grand total.
    pub total: Decimal,
    /// Its agent code.
    pub agent_code: Option<String>,
    /// Its observations text.
    pub notes: String,
    /// Product references of its lines.
    pub line_references: Vec<Option<String>>,
}

/// Everything the audit needs, gathered by the persistence layer.
#[derive(Debug)]
pub struct AuditContext<'a> {
    /// The invoice under audit.
    pub invoice: &'a Invoice,
    /// Its lines.
    pub lines: &'a [InvoiceLine],
    /// The posting entry resolved from `invoice.entry_id`; `None` when the
    /// reference is set but the entry no longer exists.
    pub linked_entry: Option<&'a JournalEntry>,
    /// Same-date invoices of the same kind, for the duplicate heuristic.
    pub candidates: &'a [DuplicateCandidate],
}

/// Result of a full audit.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    /// Every inconsistency found.
    pub findings: Vec<AuditFinding>,
    /// True when the posting-entry reference is dangling and should be
    /// cleared and re-saved by the caller.
    pub clear_entry_reference: bool,
}

impl AuditReport {
    /// Returns true if the audit found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Runs the full integrity audit over one invoice.
#[must_use]
pub fn audit_invoice(ctx: &AuditContext<'_>) -> AuditReport {
    let mut report = AuditReport::default();

    check_header_totals(ctx, &mut report);
    check_entry_linkage(ctx, &mut report);
    check_duplicates(ctx, &mut report);

    report
}

fn check_header_totals(ctx: &AuditContext<'_>, report: &mut AuditReport) {
    let computed = InvoiceTotals::from_lines(ctx.lines);
    let invoice = ctx.invoice;

    let checks = [
        (TotalField::Net, invoice.net, computed.net),
        (TotalField::Tax, invoice.tax, computed.tax),
        (TotalField::Withholding, invoice.withholding, computed.withholding),
        (TotalField::Surcharge, invoice.surcharge, computed.surcharge),
        (TotalField::Total, invoice.total, computed.total()),
    ];

    for (field, stored, recomputed) in checks {
        if !amount::within_tolerance(stored, recomputed, amount::BALANCE_TOLERANCE) {
            report.findings.push(AuditFinding::HeaderTotalMismatch {
                field,
                stored,
                computed: recomputed,
            });
        }
    }
}

fn check_entry_linkage(ctx: &AuditContext<'_>, report: &mut AuditReport) {
    let invoice = ctx.invoice;
    let Some(entry_id) = invoice.entry_id else {
        return;
    };

    let Some(entry) = ctx.linked_entry else {
        report
            .findings
            .push(AuditFinding::DanglingEntryReference { entry_id });
        report.clear_entry_reference = true;
        return;
    };

    if !entry.posts_document(invoice.kind, &invoice.code()) {
        report
            .findings
            .push(AuditFinding::EntryDocumentMismatch { entry_id: entry.id });
    }

    let expected = invoice.expected_entry_amount();
    if !amount::within_tolerance(entry.amount, expected, amount::ENTRY_AMOUNT_TOLERANCE) {
        report.findings.push(AuditFinding::EntryAmountMismatch {
            entry_amount: entry.amount,
            expected,
        });
    }
}

fn check_duplicates(ctx: &AuditContext<'_>, report: &mut AuditReport) {
    let invoice = ctx.invoice;
    let mut own_references: Vec<Option<String>> =
        ctx.lines.iter().map(|l| l.reference.clone()).collect();
    own_references.sort();

    for candidate in ctx.candidates {
        if candidate.id == invoice.id {
            continue;
        }
        let header_match = candidate.date == invoice.date
            && candidate.party_code == invoice.party_code
            && candidate.total == invoice.total
            && candidate.agent_code == invoice.agent_code
            && candidate.notes == invoice.notes;
        if !header_match {
            continue;
        }

        let mut candidate_references = candidate.line_references.clone();
        candidate_references.sort();
        report.findings.push(AuditFinding::PossibleDuplicate {
            other: candidate.id,
            identical_lines: candidate_references == own_references,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::types::tests::{make_invoice, make_line};
    use crate::ledger::entry::tests::make_entry;
    use crate::ledger::DocumentType;
    use rust_decimal_macros::dec;

    fn standard_lines() -> Vec<InvoiceLine> {
        vec![
            make_line(dec!(60.00), dec!(21)),
            make_line(dec!(40.00), dec!(21)),
        ]
    }

    #[test]
    fn test_clean_invoice() {
        let invoice = make_invoice();
        let lines = standard_lines();
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &[],
        });
        assert!(report.is_clean());
        assert!(!report.clear_entry_reference);
    }

    #[test]
    fn test_header_mismatch_reported_per_field() {
        let mut invoice = make_invoice();
        invoice.net = dec!(90.00); // lines still say 100
        let lines = standard_lines();
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &[],
        });
        assert!(report.findings.iter().any(|f| matches!(
            f,
            AuditFinding::HeaderTotalMismatch {
                field: TotalField::Net,
                ..
            }
        )));
    }

    #[test]
    fn test_dangling_entry_reference_corrected() {
        let mut invoice = make_invoice();
        invoice.entry_id = Some(balanz_shared::types::JournalEntryId::new());
        let lines = standard_lines();
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &[],
        });
        assert!(report.clear_entry_reference);
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, AuditFinding::DanglingEntryReference { .. })));
    }

    #[test]
    fn test_entry_document_and_amount_checked() {
        let mut invoice = make_invoice();
        let mut entry = make_entry(vec![(dec!(121), dec!(0)), (dec!(0), dec!(121))]);
        entry.document_type = Some(DocumentType::CustomerInvoice);
        entry.document_code = Some(invoice.code());
        entry.refresh_amount();
        invoice.entry_id = Some(entry.id);

        let lines = standard_lines();
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: Some(&entry),
            candidates: &[],
        });
        assert!(report.is_clean());

        // Wrong document code on the entry.
        entry.document_code = Some("2024A000099".to_string());
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: Some(&entry),
            candidates: &[],
        });
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, AuditFinding::EntryDocumentMismatch { .. })));
    }

    #[test]
    fn test_entry_amount_tolerance_is_two_cents() {
        let mut invoice = make_invoice();
        let mut entry = make_entry(vec![(dec!(121.02), dec!(0)), (dec!(0), dec!(121.02))]);
        entry.document_type = Some(DocumentType::CustomerInvoice);
        entry.document_code = Some(invoice.code());
        entry.refresh_amount();
        invoice.entry_id = Some(entry.id);

        let lines = standard_lines();
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: Some(&entry),
            candidates: &[],
        });
        // 121.02 vs 121.00 is inside the 0.02 tolerance.
        assert!(report.is_clean());

        let mut entry = make_entry(vec![(dec!(121.03), dec!(0)), (dec!(0), dec!(121.03))]);
        entry.document_type = Some(DocumentType::CustomerInvoice);
        entry.document_code = Some(invoice.code());
        entry.refresh_amount();
        invoice.entry_id = Some(entry.id);
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: Some(&entry),
            candidates: &[],
        });
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, AuditFinding::EntryAmountMismatch { .. })));
    }

    #[test]
    fn test_duplicate_heuristic() {
        let invoice = make_invoice();
        let lines = standard_lines();

        let twin = DuplicateCandidate {
            id: InvoiceId::new(),
            date: invoice.date,
            party_code: invoice.party_code.clone(),
            total: invoice.total,
            agent_code: invoice.agent_code.clone(),
            notes: invoice.notes.clone(),
            line_references: vec![None, None],
        };
        let unrelated = DuplicateCandidate {
            total: dec!(999.00),
            ..twin.clone()
        };
        let candidates = vec![twin.clone(), unrelated];

        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &candidates,
        });
        assert_eq!(report.findings.len(), 1);
        assert!(matches!(
            report.findings[0],
            AuditFinding::PossibleDuplicate {
                other,
                identical_lines: true,
            } if other == twin.id
        ));
    }

    #[test]
    fn test_duplicate_with_different_lines() {
        let invoice = make_invoice();
        let mut lines = standard_lines();
        lines[0].reference = Some("PROD-A".to_string());

        let twin = DuplicateCandidate {
            id: InvoiceId::new(),
            date: invoice.date,
            party_code: invoice.party_code.clone(),
            total: invoice.total,
            agent_code: invoice.agent_code.clone(),
            notes: invoice.notes.clone(),
            line_references: vec![Some("PROD-B".to_string()), None],
        };
        let candidates = vec![twin];

        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &candidates,
        });
        assert!(matches!(
            report.findings[0],
            AuditFinding::PossibleDuplicate {
                identical_lines: false,
                ..
            }
        ));
    }

    #[test]
    fn test_own_id_skipped_in_duplicates() {
        let invoice = make_invoice();
        let lines = standard_lines();
        let self_candidate = DuplicateCandidate {
            id: invoice.id,
            date: invoice.date,
            party_code: invoice.party_code.clone(),
            total: invoice.total,
            agent_code: None,
            notes: String::new(),
            line_references: vec![],
        };
        let candidates = vec![self_candidate];
        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: None,
            candidates: &candidates,
        });
        assert!(report.is_clean());
    }
}
