//! `SeaORM` Entity for the ledger_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    pub subaccount_id: Uuid,
    /// Denormalized sub-account code.
    pub subaccount_code: String,
    pub counter_subaccount_id: Option<Uuid>,
    pub counter_subaccount_code: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub currency: String,
    pub conversion_rate: Decimal,
    pub document_type: Option<String>,
    pub document_code: Option<String>,
    pub tax_id: Option<String>,
    pub vat_base: Decimal,
    pub vat_rate: Decimal,
    pub surcharge_rate: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::EntryId",
        to = "super::journal_entries::Column::Id"
    )]
    JournalEntries,
    #[sea_orm(
        belongs_to = "super::subaccounts::Entity",
        from = "Column::SubaccountId",
        to = "super::subaccounts::Column::Id"
    )]
    Subaccounts,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::subaccounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subaccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
