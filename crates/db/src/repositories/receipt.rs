//! Receipt repository.
//!
//! Receipts never recompute the owning invoice's paid/pending aggregate
//! themselves: after every save or delete the repository hands the invoice
//! and its receipts to the [`ReceiptGenerator`] collaborator and persists
//! whatever aggregate state it decides.

use balanz_core::invoice::InvoiceError;
use balanz_core::receipt::{Receipt, ReceiptGenerator};
use balanz_shared::types::{InvoiceId, ReceiptId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{invoices, receipts};

use super::invoice::invoice_to_domain;

/// Error types for receipt repository operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptRepoError {
    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    NotFound(ReceiptId),

    /// Owning invoice missing or invalid.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Receipt repository.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Saves a receipt and refreshes the owning invoice's aggregate state.
    ///
    /// Upsert and aggregate refresh share one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::NotFound`] when the owning invoice is gone,
    /// or a database error.
    pub async fn save(
        &self,
        receipt: &Receipt,
        generator: &dyn ReceiptGenerator,
    ) -> Result<(), ReceiptRepoError> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        let existing = receipts::Entity::find_by_id(receipt.id.into_inner())
            .one(&txn)
            .await?;
        let mut active = receipts::ActiveModel {
            id: Set(receipt.id.into_inner()),
            invoice_id: Set(receipt.invoice_id.into_inner()),
            number: Set(receipt.number),
            amount: Set(receipt.amount),
            due_date: Set(receipt.due_date),
            paid: Set(receipt.paid),
            paid_date: Set(receipt.paid_date),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if existing.is_some() {
            active.created_at = sea_orm::ActiveValue::NotSet;
            active.update(&txn).await?;
        } else {
            active.insert(&txn).await?;
        }

        refresh_invoice_aggregate(&txn, receipt.invoice_id, generator).await?;

        txn.commit().await?;
        tracing::debug!(receipt = %receipt.id, invoice = %receipt.invoice_id, "receipt saved");
        Ok(())
    }

    /// Deletes a receipt and refreshes the owning invoice's aggregate state.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptRepoError::NotFound`] for an unknown receipt, or a
    /// database error.
    pub async fn delete(
        &self,
        id: ReceiptId,
        generator: &dyn ReceiptGenerator,
    ) -> Result<(), ReceiptRepoError> {
        let model = receipts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(ReceiptRepoError::NotFound(id))?;
        let invoice_id = InvoiceId::from_uuid(model.invoice_id);

        let txn = self.db.begin().await?;
        receipts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;
        refresh_invoice_aggregate(&txn, invoice_id, generator).await?;
        txn.commit().await?;

        tracing::debug!(receipt = %id, invoice = %invoice_id, "receipt deleted");
        Ok(())
    }

    /// Lists an invoice's receipts ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Receipt>, ReceiptRepoError> {
        let models = list_models(&self.db, invoice_id).await?;
        Ok(models.into_iter().map(to_domain).collect())
    }
}

/// Reloads the invoice and its receipts, lets the generator recompute the
/// aggregate, and persists the paid flag.
async fn refresh_invoice_aggregate<C: ConnectionTrait>(
    conn: &C,
    invoice_id: InvoiceId,
    generator: &dyn ReceiptGenerator,
) -> Result<(), ReceiptRepoError> {
    let model = invoices::Entity::find_by_id(invoice_id.into_inner())
        .one(conn)
        .await?
        .ok_or(InvoiceError::NotFound(invoice_id))?;

    let receipts: Vec<Receipt> = list_models(conn, invoice_id)
        .await?
        .into_iter()
        .map(to_domain)
        .collect();

    let was_paid = model.paid;
    let mut invoice = invoice_to_domain(model);
    generator.update(&mut invoice, &receipts);

    if invoice.paid != was_paid {
        let mut active = invoices::ActiveModel {
            id: Set(invoice_id.into_inner()),
            ..Default::default()
        };
        active.paid = Set(invoice.paid);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await?;
        tracing::debug!(invoice = %invoice_id, paid = invoice.paid, "invoice aggregate refreshed");
    }
    Ok(())
}

async fn list_models<C: ConnectionTrait>(
    conn: &C,
    invoice_id: InvoiceId,
) -> Result<Vec<receipts::Model>, DbErr> {
    receipts::Entity::find()
        .filter(receipts::Column::InvoiceId.eq(invoice_id.into_inner()))
        .order_by_asc(receipts::Column::Number)
        .all(conn)
        .await
}

fn to_domain(model: receipts::Model) -> Receipt {
    Receipt {
        id: ReceiptId::from_uuid(model.id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        number: model.number,
        amount: model.amount,
        due_date: model.due_date,
        paid: model.paid,
        paid_date: model.paid_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_domain() {
        let now = chrono::Utc::now().into();
        let model = receipts::Model {
            id: uuid::Uuid::nil(),
            invoice_id: uuid::Uuid::nil(),
            number: 2,
            amount: dec!(60.50),
            due_date: chrono::NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
            paid: true,
            paid_date: chrono::NaiveDate::from_ymd_opt(2024, 7, 10),
            created_at: now,
            updated_at: now,
        };
        let receipt = to_domain(model);
        assert_eq!(receipt.number, 2);
        assert!(receipt.paid);
        assert_eq!(receipt.amount, dec!(60.50));
    }
}
