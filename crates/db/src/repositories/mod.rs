//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every invariant-maintaining cascade runs inside one database transaction.

pub mod fiscal;
pub mod invoice;
pub mod journal;
pub mod receipt;
pub mod subaccount;

pub use fiscal::{CreateFiscalYearInput, FiscalRepoError, FiscalRepository};
pub use invoice::{InvoiceRepoError, InvoiceRepository};
pub use journal::{JournalRepoError, JournalRepository, RenumberSummary};
pub use receipt::{ReceiptRepoError, ReceiptRepository};
pub use subaccount::{SubAccountRepoError, SubAccountRepository};
