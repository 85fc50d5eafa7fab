//! Invoice repository.
//!
//! Owns invoice persistence: the totals check at save time, the delete
//! cascade (delivery notes unlinked, receipts and lines removed, posting
//! entries delegated to the journal repository), cross-year date moves, and
//! the full integrity audit.

use balanz_core::fiscal::{locked_period_for, FiscalError};
use balanz_core::invoice::{
    audit_invoice, check_totals, AuditContext, AuditReport, DuplicateCandidate, Invoice,
    InvoiceError, InvoiceLine,
};
use balanz_core::ledger::{DocumentType, LedgerError};
use balanz_shared::types::{InvoiceId, JournalEntryId, YearCode};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{delivery_notes, fiscal_years, invoice_lines, invoices, receipts};

use super::fiscal::{periods_for_year_on, year_to_domain};
use super::journal::{find_entry_on, JournalRepoError, JournalRepository};

/// Error types for invoice repository operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceRepoError {
    /// Invoice rule violated.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Ledger gate refused the mutation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Fiscal rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Delegated journal-entry deletion failed.
    #[error(transparent)]
    Journal(#[from] JournalRepoError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Saves an invoice header and its lines.
    ///
    /// Validates the totals identity and the uniqueness of the
    /// (kind, year, series, number) triple, then upserts header and lines in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::TotalMismatch`] or
    /// [`InvoiceError::DuplicateKey`], or a database error.
    pub async fn save(
        &self,
        invoice: &Invoice,
        lines: &[InvoiceLine],
    ) -> Result<(), InvoiceRepoError> {
        check_totals(invoice)?;

        let clash = invoices::Entity::find()
            .filter(invoices::Column::Kind.eq(invoice.kind.as_str()))
            .filter(invoices::Column::YearCode.eq(invoice.year_code.as_str()))
            .filter(invoices::Column::Series.eq(invoice.series.clone()))
            .filter(invoices::Column::Number.eq(invoice.number))
            .filter(invoices::Column::Id.ne(invoice.id.into_inner()))
            .one(&self.db)
            .await?;
        if clash.is_some() {
            return Err(InvoiceError::DuplicateKey {
                year: invoice.year_code.clone(),
                series: invoice.series.clone(),
                number: invoice.number,
            }
            .into());
        }

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        let existing = invoices::Entity::find_by_id(invoice.id.into_inner())
            .one(&txn)
            .await?;
        let mut active = to_active(invoice, now);
        if existing.is_some() {
            active.created_at = sea_orm::ActiveValue::NotSet;
            active.update(&txn).await?;
        } else {
            active.insert(&txn).await?;
        }

        invoice_lines::Entity::delete_many()
            .filter(invoice_lines::Column::InvoiceId.eq(invoice.id.into_inner()))
            .exec(&txn)
            .await?;
        for line in lines {
            invoice_lines::ActiveModel {
                id: Set(uuid::Uuid::new_v4()),
                invoice_id: Set(invoice.id.into_inner()),
                reference: Set(line.reference.clone()),
                description: Set(line.description.clone()),
                quantity: Set(line.quantity),
                net: Set(line.net),
                vat_rate: Set(line.vat_rate),
                surcharge_rate: Set(line.surcharge_rate),
                withholding_rate: Set(line.withholding_rate),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Finds an invoice with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(
        &self,
        id: InvoiceId,
    ) -> Result<Option<(Invoice, Vec<InvoiceLine>)>, InvoiceRepoError> {
        let Some(model) = invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let lines = self.load_lines(id).await?;
        Ok(Some((invoice_to_domain(model), lines)))
    }

    /// Deletes an invoice, cascading through its dependents.
    ///
    /// In one transaction: delivery notes are unlinked (reference cleared,
    /// pending flag restored), receipts and lines removed, and the header
    /// deleted. The posting and payment entries are then delegated to the
    /// journal repository, which applies its own gates and sub-account
    /// recomputes.
    ///
    /// # Errors
    ///
    /// Returns a gate error when the fiscal year is closed or the date is
    /// regularized, or a database error.
    pub async fn delete(
        &self,
        id: InvoiceId,
        journal: &JournalRepository,
    ) -> Result<(), InvoiceRepoError> {
        let (invoice, _) = self
            .find(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        self.check_mutation_gates(&invoice.year_code, invoice.date)
            .await?;

        let txn = self.db.begin().await?;

        delivery_notes::Entity::update_many()
            .col_expr(
                delivery_notes::Column::InvoiceId,
                Expr::value(None::<uuid::Uuid>),
            )
            .col_expr(delivery_notes::Column::Pending, Expr::value(true))
            .filter(delivery_notes::Column::InvoiceId.eq(id.into_inner()))
            .exec(&txn)
            .await?;

        receipts::Entity::delete_many()
            .filter(receipts::Column::InvoiceId.eq(id.into_inner()))
            .exec(&txn)
            .await?;
        invoice_lines::Entity::delete_many()
            .filter(invoice_lines::Column::InvoiceId.eq(id.into_inner()))
            .exec(&txn)
            .await?;
        invoices::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::debug!(invoice = %id, "invoice deleted, delegating entry cascade");

        for entry_id in [invoice.entry_id, invoice.payment_entry_id]
            .into_iter()
            .flatten()
        {
            journal.delete_entry(entry_id).await?;
        }

        Ok(())
    }

    /// Changes an invoice's date, re-numbering on a cross-year move.
    ///
    /// Both the current and the destination position are gated (open year,
    /// date outside regularized intervals). Moving into a different fiscal
    /// year assigns the next free number of the destination (year, series).
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`FiscalError::NoYearForDate`] when no year
    /// contains the new date, or a database error.
    pub async fn change_date(
        &self,
        id: InvoiceId,
        new_date: NaiveDate,
    ) -> Result<Invoice, InvoiceRepoError> {
        let (invoice, _) = self
            .find(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        self.check_mutation_gates(&invoice.year_code, invoice.date)
            .await?;

        // Resolve the destination year within the same company.
        let current_year = self.load_year(&invoice.year_code).await?;
        let destination = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::CompanyId.eq(current_year.company_id.into_inner()))
            .filter(fiscal_years::Column::StartDate.lte(new_date))
            .filter(fiscal_years::Column::EndDate.gte(new_date))
            .one(&self.db)
            .await?
            .map(year_to_domain)
            .ok_or(FiscalError::NoYearForDate(new_date))?;

        self.check_mutation_gates(&destination.code, new_date).await?;

        let mut updated = invoice.clone();
        updated.date = new_date;
        if destination.code != invoice.year_code {
            let max_number: Option<i64> = invoices::Entity::find()
                .filter(invoices::Column::Kind.eq(invoice.kind.as_str()))
                .filter(invoices::Column::YearCode.eq(destination.code.as_str()))
                .filter(invoices::Column::Series.eq(invoice.series.clone()))
                .select_only()
                .column_as(invoices::Column::Number.max(), "max_number")
                .into_tuple()
                .one(&self.db)
                .await?
                .flatten();
            updated.year_code = destination.code.clone();
            updated.number = max_number.unwrap_or(0) + 1;
            tracing::info!(
                invoice = %id,
                from = %invoice.year_code,
                to = %destination.code,
                number = updated.number,
                "invoice moved across fiscal years"
            );
        }

        invoices::Entity::update_many()
            .col_expr(invoices::Column::Date, Expr::value(updated.date))
            .col_expr(
                invoices::Column::YearCode,
                Expr::value(updated.year_code.as_str()),
            )
            .col_expr(invoices::Column::Number, Expr::value(updated.number))
            .col_expr(
                invoices::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(invoices::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await?;

        Ok(updated)
    }

    /// Runs the full integrity audit over an invoice.
    ///
    /// Findings are reported, not corrected — except a dangling
    /// posting-entry reference, which is cleared and re-saved here.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::NotFound`] or a database error.
    pub async fn audit(&self, id: InvoiceId) -> Result<AuditReport, InvoiceRepoError> {
        let (invoice, lines) = self
            .find(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let linked_entry = match invoice.entry_id {
            Some(entry_id) => find_entry_on(&self.db, entry_id).await?,
            None => None,
        };

        let candidates = self.duplicate_candidates(&invoice).await?;

        let report = audit_invoice(&AuditContext {
            invoice: &invoice,
            lines: &lines,
            linked_entry: linked_entry.as_ref(),
            candidates: &candidates,
        });

        for finding in &report.findings {
            tracing::warn!(invoice = %id, %finding, "invoice audit finding");
        }

        if report.clear_entry_reference {
            invoices::Entity::update_many()
                .col_expr(invoices::Column::EntryId, Expr::value(None::<uuid::Uuid>))
                .filter(invoices::Column::Id.eq(id.into_inner()))
                .exec(&self.db)
                .await?;
            tracing::info!(invoice = %id, "dangling posting-entry reference cleared");
        }

        Ok(report)
    }

    /// Same-kind, same-date invoices with their line references.
    async fn duplicate_candidates(
        &self,
        invoice: &Invoice,
    ) -> Result<Vec<DuplicateCandidate>, InvoiceRepoError> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::Kind.eq(invoice.kind.as_str()))
            .filter(invoices::Column::Date.eq(invoice.date))
            .filter(invoices::Column::Id.ne(invoice.id.into_inner()))
            .all(&self.db)
            .await?;

        let mut candidates = Vec::with_capacity(models.len());
        for model in models {
            let references: Vec<Option<String>> = invoice_lines::Entity::find()
                .filter(invoice_lines::Column::InvoiceId.eq(model.id))
                .select_only()
                .column(invoice_lines::Column::Reference)
                .into_tuple()
                .all(&self.db)
                .await?;
            candidates.push(DuplicateCandidate {
                id: InvoiceId::from_uuid(model.id),
                date: model.date,
                party_code: model.party_code,
                total: model.total,
                agent_code: model.agent_code,
                notes: model.notes,
                line_references: references,
            });
        }
        Ok(candidates)
    }

    /// Refuses mutations in closed years or regularized intervals.
    async fn check_mutation_gates(
        &self,
        year_code: &YearCode,
        date: NaiveDate,
    ) -> Result<(), InvoiceRepoError> {
        let year = self.load_year(year_code).await?;
        if !year.is_open() {
            return Err(FiscalError::YearClosed(year.code).into());
        }
        let periods = periods_for_year_on(&self.db, year_code).await?;
        if locked_period_for(&periods, date).is_some() {
            return Err(LedgerError::DateInLockedPeriod(date).into());
        }
        Ok(())
    }

    async fn load_year(
        &self,
        code: &YearCode,
    ) -> Result<balanz_core::fiscal::FiscalYear, InvoiceRepoError> {
        let model = fiscal_years::Entity::find_by_id(code.as_str().to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| FiscalError::YearNotFound(code.clone()))?;
        Ok(year_to_domain(model))
    }

    async fn load_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, InvoiceRepoError> {
        let models = invoice_lines::Entity::find()
            .filter(invoice_lines::Column::InvoiceId.eq(id.into_inner()))
            .order_by_asc(invoice_lines::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(line_to_domain).collect())
    }
}

fn to_active(invoice: &Invoice, now: chrono::DateTime<chrono::FixedOffset>) -> invoices::ActiveModel {
    invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        kind: Set(invoice.kind.as_str().to_string()),
        year_code: Set(invoice.year_code.as_str().to_string()),
        series: Set(invoice.series.clone()),
        number: Set(invoice.number),
        party_code: Set(invoice.party_code.clone()),
        agent_code: Set(invoice.agent_code.clone()),
        notes: Set(invoice.notes.clone()),
        date: Set(invoice.date),
        net: Set(invoice.net),
        tax: Set(invoice.tax),
        withholding: Set(invoice.withholding),
        surcharge: Set(invoice.surcharge),
        total: Set(invoice.total),
        entry_id: Set(invoice.entry_id.map(JournalEntryId::into_inner)),
        payment_entry_id: Set(invoice.payment_entry_id.map(JournalEntryId::into_inner)),
        paid: Set(invoice.paid),
        voided: Set(invoice.voided),
        rectifies: Set(invoice.rectifies.map(InvoiceId::into_inner)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub(crate) fn invoice_to_domain(model: invoices::Model) -> Invoice {
    Invoice {
        id: InvoiceId::from_uuid(model.id),
        // The kind column is constrained in SQL; unknown values cannot occur.
        kind: DocumentType::parse(&model.kind).unwrap_or(DocumentType::CustomerInvoice),
        year_code: YearCode::trusted(model.year_code),
        series: model.series,
        number: model.number,
        party_code: model.party_code,
        agent_code: model.agent_code,
        notes: model.notes,
        date: model.date,
        net: model.net,
        tax: model.tax,
        withholding: model.withholding,
        surcharge: model.surcharge,
        total: model.total,
        entry_id: model.entry_id.map(JournalEntryId::from_uuid),
        payment_entry_id: model.payment_entry_id.map(JournalEntryId::from_uuid),
        paid: model.paid,
        voided: model.voided,
        rectifies: model.rectifies.map(InvoiceId::from_uuid),
    }
}

pub(crate) fn line_to_domain(model: invoice_lines::Model) -> InvoiceLine {
    InvoiceLine {
        reference: model.reference,
        description: model.description,
        quantity: model.quantity,
        net: model.net,
        vat_rate: model.vat_rate,
        surcharge_rate: model.surcharge_rate,
        withholding_rate: model.withholding_rate,
    }
}
