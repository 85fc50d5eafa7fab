//! Invoices and their integrity checks.
//!
//! An invoice header carries the amounts breakdown and optional links to the
//! journal entry that posted it and the entry that recorded its payment.
//! Save-time validation checks the totals identity; the expensive
//! [`audit::audit_invoice`] pass cross-checks header totals against lines,
//! verifies the posting-entry linkage, and hunts for duplicates.

pub mod audit;
pub mod error;
pub mod types;
pub mod validation;

pub use audit::{
    audit_invoice, AuditContext, AuditFinding, AuditReport, DuplicateCandidate, TotalField,
};
pub use error::InvoiceError;
pub use types::{Invoice, InvoiceLine, InvoiceTotals};
pub use validation::check_totals;
