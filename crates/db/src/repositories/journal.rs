//! Journal entry repository.
//!
//! Owns the persistence side of the entry lifecycle: creation with number
//! assignment, the delete cascade (lines removed one-by-one so each removal
//! recomputes its sub-account), the rebalance persistence, and the paged
//! renumbering job.

use balanz_core::fiscal::{locked_period_for, FiscalError, FiscalYear};
use balanz_core::ledger::{
    next_number, rebalance, renumber_plan_from, DocumentType, JournalEntry, LedgerError,
    LedgerLine, LedgerService, NewJournalEntry, RepairReport,
};
use balanz_core::ledger::numbering::RENUMBER_PAGE_SIZE;
use balanz_shared::config::LedgerConfig;
use balanz_shared::types::{JournalEntryId, LedgerLineId, SubAccountId, YearCode};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{entry_sequences, fiscal_years, invoices, journal_entries, ledger_lines};

use super::fiscal::{periods_for_year_on, year_to_domain};
use super::subaccount::{find_by_code_on, recompute_totals_on, SubAccountRepoError};

/// Error types for journal repository operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalRepoError {
    /// Ledger rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Fiscal rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Sub-account maintenance failed.
    #[error(transparent)]
    SubAccount(#[from] SubAccountRepoError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of renumbering every open fiscal year.
#[derive(Debug, Default)]
pub struct RenumberSummary {
    /// Total entries whose number changed.
    pub changed: u64,
    /// Years whose renumbering aborted; committed pages stay committed.
    pub failed_years: Vec<YearCode>,
}

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    renumber_page_size: u64,
}

impl JournalRepository {
    /// Creates a new journal repository with the default renumber page size.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            renumber_page_size: RENUMBER_PAGE_SIZE,
        }
    }

    /// Creates a journal repository tuned by the ledger configuration.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            renumber_page_size: config.renumber_page_size,
        }
    }

    /// Creates a journal entry with an auto-assigned sequential number.
    ///
    /// Validates structure, balance, and fiscal gates; resolves sub-account
    /// codes; assigns the first free number of the year; and persists entry,
    /// lines, sub-account totals, and the year's sequence record in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns the validation error, [`LedgerError::SubAccountNotFound`] for
    /// an unknown code, or a database error.
    pub async fn create_entry(
        &self,
        input: NewJournalEntry,
    ) -> Result<JournalEntry, JournalRepoError> {
        let year = self.load_year(&input.year_code).await?;
        let periods = periods_for_year_on(&self.db, &year.code).await?;

        let mut entry = self.resolve_entry(&input).await?;
        let totals = LedgerService::validate_entry(&entry, &year, &periods)?;
        entry.amount = totals.amount();

        let txn = self.db.begin().await?;

        let existing: Vec<i64> = journal_entries::Entity::find()
            .filter(journal_entries::Column::YearCode.eq(entry.year_code.as_str()))
            .select_only()
            .column(journal_entries::Column::Number)
            .into_tuple()
            .all(&txn)
            .await?;
        entry.number = next_number(&existing);

        let now = chrono::Utc::now().into();
        journal_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            number: Set(entry.number),
            year_code: Set(entry.year_code.as_str().to_string()),
            date: Set(entry.date),
            concept: Set(entry.concept.clone()),
            editable: Set(entry.editable),
            document_type: Set(entry.document_type.map(|d| d.as_str().to_string())),
            document_code: Set(entry.document_code.clone()),
            amount: Set(entry.amount),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in &entry.lines {
            ledger_lines::ActiveModel {
                id: Set(line.id.into_inner()),
                entry_id: Set(line.entry_id.into_inner()),
                subaccount_id: Set(line.subaccount_id.into_inner()),
                subaccount_code: Set(line.subaccount_code.clone()),
                counter_subaccount_id: Set(line.counter_subaccount_id.map(SubAccountId::into_inner)),
                counter_subaccount_code: Set(line.counter_subaccount_code.clone()),
                debit: Set(line.debit),
                credit: Set(line.credit),
                currency: Set(line.currency.clone()),
                conversion_rate: Set(line.conversion_rate),
                document_type: Set(line.document_type.map(|d| d.as_str().to_string())),
                document_code: Set(line.document_code.clone()),
                tax_id: Set(line.tax_id.clone()),
                vat_base: Set(line.vat_base),
                vat_rate: Set(line.vat_rate),
                surcharge_rate: Set(line.surcharge_rate),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        for subaccount_id in distinct_subaccounts(&entry.lines) {
            recompute_totals_on(&txn, subaccount_id).await?;
        }

        advance_sequence(&txn, &entry.year_code, entry.number + 1).await?;

        txn.commit().await?;

        tracing::debug!(
            entry = %entry.id,
            year = %entry.year_code,
            number = entry.number,
            amount = %entry.amount,
            "journal entry created"
        );

        Ok(entry)
    }

    /// Finds a journal entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, JournalRepoError> {
        find_entry_on(&self.db, id).await.map_err(Into::into)
    }

    /// Deletes a journal entry, cascading to its lines.
    ///
    /// Gated by the fiscal rules (open year, date outside regularized
    /// intervals; system entries exempt). Lines are deleted one-by-one —
    /// deliberately trading per-row round trips for the sub-account
    /// recompute after each removal — and any invoice pointing at the entry
    /// is unlinked. The whole cascade is one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EntryNotFound`], a gate error, or a database
    /// error.
    pub async fn delete_entry(&self, id: JournalEntryId) -> Result<(), JournalRepoError> {
        let entry = self
            .find_entry(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;
        let year = self.load_year(&entry.year_code).await?;
        let periods = periods_for_year_on(&self.db, &year.code).await?;

        LedgerService::validate_can_delete(&entry, &year, &periods)?;

        let txn = self.db.begin().await?;

        for line in &entry.lines {
            ledger_lines::Entity::delete_by_id(line.id.into_inner())
                .exec(&txn)
                .await?;
            recompute_totals_on(&txn, line.subaccount_id).await?;
            tracing::debug!(line = %line.id, subaccount = %line.subaccount_code, "ledger line deleted");
        }

        journal_entries::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;

        invoices::Entity::update_many()
            .col_expr(invoices::Column::EntryId, Expr::value(None::<uuid::Uuid>))
            .filter(invoices::Column::EntryId.eq(id.into_inner()))
            .exec(&txn)
            .await?;
        invoices::Entity::update_many()
            .col_expr(
                invoices::Column::PaymentEntryId,
                Expr::value(None::<uuid::Uuid>),
            )
            .filter(invoices::Column::PaymentEntryId.eq(id.into_inner()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::debug!(entry = %id, year = %entry.year_code, "journal entry deleted");
        Ok(())
    }

    /// Changes an entry's date within its fiscal year.
    ///
    /// Both the current and the target date are gated: the entry must be
    /// editable, the year open, and neither date regularized (system entries
    /// exempt). Entries never move across fiscal years; renumbering is a
    /// separate, year-wide operation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotEditable`], a gate error, or
    /// [`LedgerError::DateOutsideYear`] when the new date leaves the year.
    pub async fn change_entry_date(
        &self,
        id: JournalEntryId,
        new_date: chrono::NaiveDate,
    ) -> Result<JournalEntry, JournalRepoError> {
        let mut entry = self
            .find_entry(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;
        let year = self.load_year(&entry.year_code).await?;
        let periods = periods_for_year_on(&self.db, &year.code).await?;

        LedgerService::validate_can_modify(&entry, &year, &periods)?;

        if !year.contains(new_date) {
            return Err(LedgerError::DateOutsideYear {
                date: new_date,
                year: year.code.clone(),
            }
            .into());
        }
        if !year.is_system_entry(entry.id) && locked_period_for(&periods, new_date).is_some() {
            return Err(LedgerError::DateInLockedPeriod(new_date).into());
        }

        journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::Date, Expr::value(new_date))
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await?;

        entry.date = new_date;
        Ok(entry)
    }

    /// Runs the best-effort rebalance over an entry and persists the result.
    ///
    /// Only the lines the repair changed (plus the refreshed amount) are
    /// written; the touched sub-accounts are recomputed in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RepairFailed`] when the residual cannot be
    /// absorbed; no rows are written in that case.
    pub async fn rebalance_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<RepairReport, JournalRepoError> {
        let mut entry = self
            .find_entry(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))?;

        let report = rebalance(&mut entry)?;
        if report.changed_lines.is_empty() && !report.amount_changed {
            return Ok(report);
        }

        let txn = self.db.begin().await?;

        let mut touched_subaccounts = Vec::new();
        for line in &entry.lines {
            if !report.changed_lines.contains(&line.id) {
                continue;
            }
            ledger_lines::Entity::update_many()
                .col_expr(ledger_lines::Column::Debit, Expr::value(line.debit))
                .col_expr(ledger_lines::Column::Credit, Expr::value(line.credit))
                .filter(ledger_lines::Column::Id.eq(line.id.into_inner()))
                .exec(&txn)
                .await?;
            if !touched_subaccounts.contains(&line.subaccount_id) {
                touched_subaccounts.push(line.subaccount_id);
            }
        }

        for subaccount_id in touched_subaccounts {
            recompute_totals_on(&txn, subaccount_id).await?;
        }

        journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::Amount, Expr::value(entry.amount))
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            entry = %id,
            outcome = ?report.outcome,
            changed = report.changed_lines.len(),
            "journal entry rebalanced"
        );
        Ok(report)
    }

    /// Renumbers an open fiscal year's entries to 1..N in (date, id) order.
    ///
    /// Entries are walked in pages (default [`RENUMBER_PAGE_SIZE`]) to bound
    /// memory; each page commits in its own transaction and only rows whose
    /// number changed are written. A failing page aborts the year — pages
    /// already committed stay committed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::YearClosed`] for a closed year or
    /// [`LedgerError::RenumberAborted`] when a page fails.
    pub async fn renumber_year(&self, year_code: &YearCode) -> Result<u64, JournalRepoError> {
        let year = self.load_year(year_code).await?;
        if !year.is_open() {
            return Err(LedgerError::YearClosed(year_code.clone()).into());
        }

        let mut paginator = journal_entries::Entity::find()
            .filter(journal_entries::Column::YearCode.eq(year_code.as_str()))
            .order_by_asc(journal_entries::Column::Date)
            .order_by_asc(journal_entries::Column::Id)
            .paginate(&self.db, self.renumber_page_size);

        let mut changed: u64 = 0;
        let mut position: i64 = 1;

        while let Some(page) = paginator.fetch_and_next().await? {
            let ordered: Vec<(JournalEntryId, i64)> = page
                .iter()
                .map(|m| (JournalEntryId::from_uuid(m.id), m.number))
                .collect();
            let plan = renumber_plan_from(&ordered, position);
            #[allow(clippy::cast_possible_wrap)]
            {
                position += ordered.len() as i64;
            }
            if plan.is_empty() {
                continue;
            }

            let applied = self.apply_renumber_page(&plan).await;
            match applied {
                Ok(count) => changed += count,
                Err(err) => {
                    tracing::warn!(
                        year = %year_code,
                        committed = changed,
                        error = %err,
                        "renumbering aborted mid-year"
                    );
                    return Err(LedgerError::RenumberAborted {
                        year: year_code.clone(),
                        reason: err.to_string(),
                    }
                    .into());
                }
            }
        }

        advance_sequence(&self.db, year_code, position).await?;

        tracing::info!(year = %year_code, changed, "fiscal year renumbered");
        Ok(changed)
    }

    /// Renumbers every open fiscal year, continuing past per-year failures.
    ///
    /// # Errors
    ///
    /// Returns an error only if the year listing itself fails; per-year
    /// failures are collected in the summary.
    pub async fn renumber_all(&self) -> Result<RenumberSummary, JournalRepoError> {
        let years = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::Status.eq("open"))
            .order_by_asc(fiscal_years::Column::StartDate)
            .all(&self.db)
            .await?;

        let mut summary = RenumberSummary::default();
        for model in years {
            let code = YearCode::trusted(model.code);
            match self.renumber_year(&code).await {
                Ok(count) => summary.changed += count,
                Err(err) => {
                    tracing::warn!(year = %code, error = %err, "skipping year after renumber failure");
                    summary.failed_years.push(code);
                }
            }
        }
        Ok(summary)
    }

    /// Applies one page of renumber assignments in a single transaction.
    async fn apply_renumber_page(
        &self,
        plan: &[balanz_core::ledger::RenumberAssignment],
    ) -> Result<u64, DbErr> {
        let txn = self.db.begin().await?;
        for assignment in plan {
            journal_entries::Entity::update_many()
                .col_expr(
                    journal_entries::Column::Number,
                    Expr::value(assignment.new_number),
                )
                .filter(journal_entries::Column::Id.eq(assignment.entry_id.into_inner()))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(plan.len() as u64)
    }

    /// Loads a fiscal year as its domain type.
    async fn load_year(&self, code: &YearCode) -> Result<FiscalYear, JournalRepoError> {
        let model = fiscal_years::Entity::find_by_id(code.as_str().to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| FiscalError::YearNotFound(code.clone()))?;
        Ok(year_to_domain(model))
    }

    /// Resolves input lines to domain lines, looking up sub-accounts by code.
    async fn resolve_entry(&self, input: &NewJournalEntry) -> Result<JournalEntry, JournalRepoError> {
        let entry_id = JournalEntryId::new();
        let mut lines = Vec::with_capacity(input.lines.len());

        for line in &input.lines {
            let subaccount = find_by_code_on(&self.db, &input.year_code, &line.subaccount_code)
                .await?
                .ok_or_else(|| LedgerError::SubAccountNotFound {
                    code: line.subaccount_code.clone(),
                    year: input.year_code.clone(),
                })?;

            let counter_subaccount_id = match &line.counter_subaccount_code {
                Some(code) => find_by_code_on(&self.db, &input.year_code, code)
                    .await?
                    .map(|m| SubAccountId::from_uuid(m.id)),
                None => None,
            };

            lines.push(LedgerLine {
                id: LedgerLineId::new(),
                entry_id,
                subaccount_id: SubAccountId::from_uuid(subaccount.id),
                subaccount_code: line.subaccount_code.clone(),
                counter_subaccount_id,
                counter_subaccount_code: line.counter_subaccount_code.clone(),
                debit: line.debit,
                credit: line.credit,
                currency: line.currency.clone(),
                conversion_rate: line.conversion_rate,
                document_type: line.document_type,
                document_code: line.document_code.clone(),
                tax_id: line.tax_id.clone(),
                vat_base: line.vat_base,
                vat_rate: line.vat_rate,
                surcharge_rate: line.surcharge_rate,
            });
        }

        Ok(JournalEntry {
            id: entry_id,
            number: 0,
            year_code: input.year_code.clone(),
            date: input.date,
            concept: input.concept.clone(),
            editable: true,
            document_type: input.document_type,
            document_code: input.document_code.clone(),
            amount: rust_decimal::Decimal::ZERO,
            lines,
        })
    }
}

/// Loads an entry and its lines as the domain aggregate, over any connection.
pub(crate) async fn find_entry_on<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
) -> Result<Option<JournalEntry>, DbErr> {
    let Some(model) = journal_entries::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let line_models = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::EntryId.eq(id.into_inner()))
        .order_by_asc(ledger_lines::Column::Id)
        .all(conn)
        .await?;

    Ok(Some(entry_to_domain(model, line_models)))
}

/// Distinct sub-accounts referenced by the lines, in first-seen order.
fn distinct_subaccounts(lines: &[LedgerLine]) -> Vec<SubAccountId> {
    let mut seen = Vec::new();
    for line in lines {
        if !seen.contains(&line.subaccount_id) {
            seen.push(line.subaccount_id);
        }
    }
    seen
}

/// Moves the year's sequence record forward, never backward.
async fn advance_sequence<C: ConnectionTrait>(
    conn: &C,
    year_code: &YearCode,
    next_number: i64,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().into();
    let existing = entry_sequences::Entity::find_by_id(year_code.as_str().to_string())
        .one(conn)
        .await?;

    match existing {
        None => {
            entry_sequences::ActiveModel {
                year_code: Set(year_code.as_str().to_string()),
                next_number: Set(next_number),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
        Some(model) if model.next_number < next_number => {
            let mut active: entry_sequences::ActiveModel = model.into();
            active.next_number = Set(next_number);
            active.updated_at = Set(now);
            active.update(conn).await?;
        }
        Some(_) => {}
    }
    Ok(())
}

pub(crate) fn entry_to_domain(
    model: journal_entries::Model,
    line_models: Vec<ledger_lines::Model>,
) -> JournalEntry {
    let lines = line_models.into_iter().map(line_to_domain).collect();
    JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        number: model.number,
        year_code: YearCode::trusted(model.year_code),
        date: model.date,
        concept: model.concept,
        editable: model.editable,
        document_type: model.document_type.as_deref().and_then(DocumentType::parse),
        document_code: model.document_code,
        amount: model.amount,
        lines,
    }
}

fn line_to_domain(model: ledger_lines::Model) -> LedgerLine {
    LedgerLine {
        id: LedgerLineId::from_uuid(model.id),
        entry_id: JournalEntryId::from_uuid(model.entry_id),
        subaccount_id: SubAccountId::from_uuid(model.subaccount_id),
        subaccount_code: model.subaccount_code,
        counter_subaccount_id: model.counter_subaccount_id.map(SubAccountId::from_uuid),
        counter_subaccount_code: model.counter_subaccount_code,
        debit: model.debit,
        credit: model.credit,
        currency: model.currency,
        conversion_rate: model.conversion_rate,
        document_type: model.document_type.as_deref().and_then(DocumentType::parse),
        document_code: model.document_code,
        tax_id: model.tax_id,
        vat_base: model.vat_base,
        vat_rate: model.vat_rate,
        surcharge_rate: model.surcharge_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry_model(number: i64) -> journal_entries::Model {
        let now = chrono::Utc::now().into();
        journal_entries::Model {
            id: uuid::Uuid::nil(),
            number,
            year_code: "2024".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            concept: "Sale".to_string(),
            editable: true,
            document_type: Some("customer_invoice".to_string()),
            document_code: Some("2024A000017".to_string()),
            amount: dec!(121.00),
            created_at: now,
            updated_at: now,
        }
    }

    fn line_model(debit: rust_decimal::Decimal, credit: rust_decimal::Decimal) -> ledger_lines::Model {
        let now = chrono::Utc::now().into();
        ledger_lines::Model {
            id: uuid::Uuid::new_v4(),
            entry_id: uuid::Uuid::nil(),
            subaccount_id: uuid::Uuid::new_v4(),
            subaccount_code: "4300000001".to_string(),
            counter_subaccount_id: None,
            counter_subaccount_code: None,
            debit,
            credit,
            currency: "EUR".to_string(),
            conversion_rate: dec!(1),
            document_type: None,
            document_code: None,
            tax_id: None,
            vat_base: dec!(0),
            vat_rate: dec!(0),
            surcharge_rate: dec!(0),
            created_at: now,
        }
    }

    #[test]
    fn test_entry_to_domain() {
        let entry = entry_to_domain(
            entry_model(17),
            vec![line_model(dec!(121), dec!(0)), line_model(dec!(0), dec!(121))],
        );
        assert_eq!(entry.number, 17);
        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.document_type, Some(DocumentType::CustomerInvoice));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_entry_to_domain_unknown_document_type() {
        let mut model = entry_model(1);
        model.document_type = Some("legacy_thing".to_string());
        let entry = entry_to_domain(model, vec![]);
        assert_eq!(entry.document_type, None);
    }

    #[test]
    fn test_distinct_subaccounts_preserves_first_seen_order() {
        let a = line_to_domain(line_model(dec!(10), dec!(0)));
        let mut b = line_to_domain(line_model(dec!(0), dec!(10)));
        b.subaccount_id = a.subaccount_id;
        let c = line_to_domain(line_model(dec!(5), dec!(0)));

        let distinct = distinct_subaccounts(&[a.clone(), b, c.clone()]);
        assert_eq!(distinct, vec![a.subaccount_id, c.subaccount_id]);
    }
}
