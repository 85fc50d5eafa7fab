//! Sub-account repository.
//!
//! Sub-accounts cache debit/credit/balance totals over their ledger lines.
//! The cache is maintained reactively: [`recompute_totals_on`] runs inside
//! the same transaction as every line mutation.

use balanz_core::ledger::{SubAccount, SubAccountTotals};
use balanz_shared::types::{SubAccountId, YearCode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{ledger_lines, subaccounts};

/// Error types for sub-account repository operations.
#[derive(Debug, thiserror::Error)]
pub enum SubAccountRepoError {
    /// Sub-account not found.
    #[error("Sub-account not found: {0}")]
    NotFound(SubAccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Sub-account repository.
#[derive(Debug, Clone)]
pub struct SubAccountRepository {
    db: DatabaseConnection,
}

impl SubAccountRepository {
    /// Creates a new sub-account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a sub-account by code within a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_code(
        &self,
        year_code: &YearCode,
        code: &str,
    ) -> Result<Option<SubAccount>, SubAccountRepoError> {
        let model = find_by_code_on(&self.db, year_code, code).await?;
        Ok(model.map(to_domain))
    }

    /// Finds a sub-account by code, creating it if missing.
    ///
    /// Entities needing a year-specific sub-account (a customer posted to
    /// for the first time in a year) call this on demand. The parent account
    /// code defaults to the leading digits of the sub-account code.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or insert fails.
    pub async fn get_or_create(
        &self,
        year_code: &YearCode,
        code: &str,
        account_code: Option<&str>,
    ) -> Result<SubAccount, SubAccountRepoError> {
        if let Some(existing) = self.find_by_code(year_code, code).await? {
            return Ok(existing);
        }

        let account_code = account_code
            .map_or_else(|| code.chars().take(3).collect(), ToString::to_string);
        let sub = SubAccount::new(code, year_code.clone(), account_code);

        let now = chrono::Utc::now().into();
        let model = subaccounts::ActiveModel {
            id: Set(sub.id.into_inner()),
            code: Set(sub.code.clone()),
            year_code: Set(sub.year_code.as_str().to_string()),
            account_code: Set(sub.account_code.clone()),
            currency: Set(sub.currency.clone()),
            tax_code: Set(sub.tax_code.clone()),
            debit: Set(sub.totals.debit),
            credit: Set(sub.totals.credit),
            balance: Set(sub.totals.balance),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(&self.db).await?;

        Ok(sub)
    }

    /// Lists the sub-accounts of a fiscal year ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_year(
        &self,
        year_code: &YearCode,
    ) -> Result<Vec<SubAccount>, SubAccountRepoError> {
        let models = subaccounts::Entity::find()
            .filter(subaccounts::Column::YearCode.eq(year_code.as_str()))
            .order_by_asc(subaccounts::Column::Code)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    /// Recomputes and persists a sub-account's cached totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-account is missing or the update fails.
    pub async fn recompute_totals(
        &self,
        id: SubAccountId,
    ) -> Result<SubAccountTotals, SubAccountRepoError> {
        recompute_totals_on(&self.db, id).await
    }
}

/// Finds a sub-account model by (year, code) over any connection.
pub(crate) async fn find_by_code_on<C: ConnectionTrait>(
    conn: &C,
    year_code: &YearCode,
    code: &str,
) -> Result<Option<subaccounts::Model>, DbErr> {
    subaccounts::Entity::find()
        .filter(subaccounts::Column::YearCode.eq(year_code.as_str()))
        .filter(subaccounts::Column::Code.eq(code))
        .one(conn)
        .await
}

/// Recomputes a sub-account's totals from its lines and persists the cache.
///
/// Runs over any connection so callers can keep it inside the transaction
/// that mutated the lines.
pub(crate) async fn recompute_totals_on<C: ConnectionTrait>(
    conn: &C,
    id: SubAccountId,
) -> Result<SubAccountTotals, SubAccountRepoError> {
    let model = subaccounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(SubAccountRepoError::NotFound(id))?;

    let lines = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::SubaccountId.eq(id.into_inner()))
        .all(conn)
        .await?;

    let totals = SubAccountTotals::from_lines(lines.into_iter().map(|l| (l.debit, l.credit)));

    if totals.debit != model.debit || totals.credit != model.credit || totals.balance != model.balance
    {
        let mut active: subaccounts::ActiveModel = model.into();
        active.debit = Set(totals.debit);
        active.credit = Set(totals.credit);
        active.balance = Set(totals.balance);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await?;
    }

    Ok(totals)
}

pub(crate) fn to_domain(model: subaccounts::Model) -> SubAccount {
    SubAccount {
        id: SubAccountId::from_uuid(model.id),
        code: model.code,
        year_code: YearCode::trusted(model.year_code),
        account_code: model.account_code,
        currency: model.currency,
        tax_code: model.tax_code,
        totals: SubAccountTotals {
            debit: model.debit,
            credit: model.credit,
            balance: model.balance,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_domain() {
        let now = chrono::Utc::now().into();
        let model = subaccounts::Model {
            id: uuid::Uuid::nil(),
            code: "4300000001".to_string(),
            year_code: "2024".to_string(),
            account_code: "430".to_string(),
            currency: "EUR".to_string(),
            tax_code: None,
            debit: dec!(150.00),
            credit: dec!(30.00),
            balance: dec!(120.00),
            created_at: now,
            updated_at: now,
        };
        let sub = to_domain(model);
        assert_eq!(sub.code, "4300000001");
        assert_eq!(sub.totals.balance, dec!(120.00));
        assert_eq!(sub.year_code.as_str(), "2024");
    }
}
