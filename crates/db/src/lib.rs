//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every invariant-maintaining cascade (entry delete + line deletes +
//! sub-account recompute, invoice delete + unlinks) runs inside one explicit
//! database transaction.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    FiscalRepository, InvoiceRepository, JournalRepository, ReceiptRepository,
    SubAccountRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
