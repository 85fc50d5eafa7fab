//! Fiscal year and tax-period repository.

use balanz_core::fiscal::{
    FiscalError, FiscalYear, PeriodCode, TaxRegularizationPeriod, YearStatus,
};
use balanz_shared::types::{CompanyId, JournalEntryId, SubAccountId, TaxPeriodId, YearCode};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{fiscal_years, tax_periods};

/// Error types for fiscal repository operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalRepoError {
    /// Domain rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Short alphanumeric code (natural key).
    pub code: YearCode,
    /// Company the year belongs to.
    pub company_id: CompanyId,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year (inclusive).
    pub end_date: NaiveDate,
}

/// Fiscal year and tax-period repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fiscal year after range validation and overlap rejection.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted, the range overlaps an
    /// existing year of the same company, or the insert fails.
    pub async fn create_year(
        &self,
        input: CreateFiscalYearInput,
    ) -> Result<FiscalYear, FiscalRepoError> {
        let year = FiscalYear::new(
            input.code,
            input.company_id,
            input.start_date,
            input.end_date,
        )?;

        self.check_overlap(&year).await?;

        let now = chrono::Utc::now().into();
        let model = fiscal_years::ActiveModel {
            code: Set(year.code.as_str().to_string()),
            company_id: Set(year.company_id.into_inner()),
            start_date: Set(year.start_date),
            end_date: Set(year.end_date),
            status: Set(status_to_db(year.status).to_string()),
            opening_entry_id: Set(None),
            closing_entry_id: Set(None),
            profit_loss_entry_id: Set(None),
            subaccount_code_length: Set(i16::from(year.subaccount_code_length)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(&self.db).await?;

        Ok(year)
    }

    /// Finds a fiscal year by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_year(&self, code: &YearCode) -> Result<Option<FiscalYear>, FiscalRepoError> {
        let model = fiscal_years::Entity::find_by_id(code.as_str().to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(year_to_domain))
    }

    /// Finds the fiscal year containing the given date.
    ///
    /// When no year contains the date and `create_if_missing` is set, the
    /// calendar year of the date is synthesized (rejecting overlap with
    /// existing years) and persisted.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalError::NoYearForDate`] when no year matches and
    /// auto-creation is off.
    pub async fn year_for_date(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
        create_if_missing: bool,
    ) -> Result<FiscalYear, FiscalRepoError> {
        let existing = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::CompanyId.eq(company_id.into_inner()))
            .filter(fiscal_years::Column::StartDate.lte(date))
            .filter(fiscal_years::Column::EndDate.gte(date))
            .one(&self.db)
            .await?;

        if let Some(model) = existing {
            return Ok(year_to_domain(model));
        }
        if !create_if_missing {
            return Err(FiscalError::NoYearForDate(date).into());
        }

        let year = FiscalYear::from_date(company_id, date);
        self.create_year(CreateFiscalYearInput {
            code: year.code,
            company_id,
            start_date: year.start_date,
            end_date: year.end_date,
        })
        .await
    }

    /// Lists a company's fiscal years, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_years(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<FiscalYear>, FiscalRepoError> {
        let models = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_desc(fiscal_years::Column::StartDate)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(year_to_domain).collect())
    }

    /// Closes a fiscal year, recording its year-end system entries.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalError::YearNotFound`] if the code is unknown.
    pub async fn close_year(
        &self,
        code: &YearCode,
        closing_entry_id: Option<JournalEntryId>,
        profit_loss_entry_id: Option<JournalEntryId>,
    ) -> Result<FiscalYear, FiscalRepoError> {
        let model = fiscal_years::Entity::find_by_id(code.as_str().to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| FiscalError::YearNotFound(code.clone()))?;

        let mut active: fiscal_years::ActiveModel = model.into();
        active.status = Set(status_to_db(YearStatus::Closed).to_string());
        active.closing_entry_id = Set(closing_entry_id.map(JournalEntryId::into_inner));
        active.profit_loss_entry_id = Set(profit_loss_entry_id.map(JournalEntryId::into_inner));
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&self.db).await?;

        Ok(year_to_domain(updated))
    }

    /// Saves a tax regularization period.
    ///
    /// Overlap with existing periods of the year is tolerated (corrections
    /// may re-regularize part of an interval) but logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn save_period(
        &self,
        period: TaxRegularizationPeriod,
    ) -> Result<TaxRegularizationPeriod, FiscalRepoError> {
        let existing = self.periods_for_year(&period.year_code).await?;
        if let Some(other) = existing.iter().find(|p| p.overlaps(&period)) {
            tracing::warn!(
                year = %period.year_code,
                new_period = %period.period,
                existing_period = %other.period,
                "tax regularization periods overlap"
            );
        }

        let model = tax_periods::ActiveModel {
            id: Set(period.id.into_inner()),
            year_code: Set(period.year_code.as_str().to_string()),
            period: Set(period.period.to_string()),
            start_date: Set(period.start_date),
            end_date: Set(period.end_date),
            creditor_subaccount_id: Set(period.creditor_subaccount_id.map(SubAccountId::into_inner)),
            debtor_subaccount_id: Set(period.debtor_subaccount_id.map(SubAccountId::into_inner)),
            created_at: Set(chrono::Utc::now().into()),
        };
        model.insert(&self.db).await?;

        Ok(period)
    }

    /// Lists the regularization periods of a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn periods_for_year(
        &self,
        year_code: &YearCode,
    ) -> Result<Vec<TaxRegularizationPeriod>, FiscalRepoError> {
        Ok(periods_for_year_on(&self.db, year_code).await?)
    }

    /// Rejects a candidate year whose range overlaps an existing one.
    async fn check_overlap(&self, year: &FiscalYear) -> Result<(), FiscalRepoError> {
        let overlapping = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::CompanyId.eq(year.company_id.into_inner()))
            .filter(fiscal_years::Column::Code.ne(year.code.as_str()))
            .filter(fiscal_years::Column::StartDate.lte(year.end_date))
            .filter(fiscal_years::Column::EndDate.gte(year.start_date))
            .one(&self.db)
            .await?;

        if let Some(existing) = overlapping {
            return Err(FiscalError::OverlappingYear {
                candidate: year.code.clone(),
                existing: YearCode::trusted(existing.code),
            }
            .into());
        }
        Ok(())
    }
}

/// Loads a year's regularization periods over any connection.
pub(crate) async fn periods_for_year_on<C: ConnectionTrait>(
    conn: &C,
    year_code: &YearCode,
) -> Result<Vec<TaxRegularizationPeriod>, DbErr> {
    let models = tax_periods::Entity::find()
        .filter(tax_periods::Column::YearCode.eq(year_code.as_str()))
        .order_by_asc(tax_periods::Column::StartDate)
        .all(conn)
        .await?;
    Ok(models.into_iter().map(period_to_domain).collect())
}

pub(crate) fn status_to_db(status: YearStatus) -> &'static str {
    match status {
        YearStatus::Open => "open",
        YearStatus::Closed => "closed",
    }
}

pub(crate) fn status_from_db(status: &str) -> YearStatus {
    if status == "closed" {
        YearStatus::Closed
    } else {
        YearStatus::Open
    }
}

pub(crate) fn year_to_domain(model: fiscal_years::Model) -> FiscalYear {
    FiscalYear {
        code: YearCode::trusted(model.code),
        company_id: CompanyId::from_uuid(model.company_id),
        start_date: model.start_date,
        end_date: model.end_date,
        status: status_from_db(&model.status),
        opening_entry_id: model.opening_entry_id.map(JournalEntryId::from_uuid),
        closing_entry_id: model.closing_entry_id.map(JournalEntryId::from_uuid),
        profit_loss_entry_id: model.profit_loss_entry_id.map(JournalEntryId::from_uuid),
        subaccount_code_length: u8::try_from(model.subaccount_code_length).unwrap_or(
            FiscalYear::DEFAULT_SUBACCOUNT_CODE_LENGTH,
        ),
    }
}

fn period_to_domain(model: tax_periods::Model) -> TaxRegularizationPeriod {
    TaxRegularizationPeriod {
        id: TaxPeriodId::from_uuid(model.id),
        year_code: YearCode::trusted(model.year_code),
        // Legacy rows may carry unknown codes; the dates are what lock.
        period: PeriodCode::parse(&model.period).unwrap_or(PeriodCode::FullYear),
        start_date: model.start_date,
        end_date: model.end_date,
        creditor_subaccount_id: model.creditor_subaccount_id.map(SubAccountId::from_uuid),
        debtor_subaccount_id: model.debtor_subaccount_id.map(SubAccountId::from_uuid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_year_model(status: &str) -> fiscal_years::Model {
        let now = chrono::Utc::now().into();
        fiscal_years::Model {
            code: "2024".to_string(),
            company_id: uuid::Uuid::nil(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            status: status.to_string(),
            opening_entry_id: None,
            closing_entry_id: None,
            profit_loss_entry_id: None,
            subaccount_code_length: 10,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(status_from_db(status_to_db(YearStatus::Open)), YearStatus::Open);
        assert_eq!(
            status_from_db(status_to_db(YearStatus::Closed)),
            YearStatus::Closed
        );
        // Unknown strings default to open rather than locking the year.
        assert_eq!(status_from_db("unknown"), YearStatus::Open);
    }

    #[test]
    fn test_year_to_domain() {
        let year = year_to_domain(make_year_model("open"));
        assert_eq!(year.code.as_str(), "2024");
        assert!(year.is_open());
        assert_eq!(year.subaccount_code_length, 10);

        let closed = year_to_domain(make_year_model("closed"));
        assert!(!closed.is_open());
    }

    #[test]
    fn test_period_to_domain_tolerates_legacy_codes() {
        let now = chrono::Utc::now().into();
        let model = tax_periods::Model {
            id: uuid::Uuid::nil(),
            year_code: "2024".to_string(),
            period: "???".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            creditor_subaccount_id: None,
            debtor_subaccount_id: None,
            created_at: now,
        };
        let period = period_to_domain(model);
        assert_eq!(period.period, PeriodCode::FullYear);
        assert!(period.contains(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }
}
