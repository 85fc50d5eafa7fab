//! `SeaORM` Entity for the fiscal_years table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fiscal_years")]
pub struct Model {
    /// Short alphanumeric code, the natural key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub company_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    /// "open" or "closed".
    pub status: String,
    pub opening_entry_id: Option<Uuid>,
    pub closing_entry_id: Option<Uuid>,
    pub profit_loss_entry_id: Option<Uuid>,
    pub subaccount_code_length: i16,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_entries::Entity")]
    JournalEntries,
    #[sea_orm(has_many = "super::tax_periods::Entity")]
    TaxPeriods,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::tax_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
