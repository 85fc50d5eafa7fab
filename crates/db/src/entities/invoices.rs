//! `SeaORM` Entity for the invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// "customer_invoice" or "supplier_invoice".
    pub kind: String,
    pub year_code: String,
    pub series: String,
    pub number: i64,
    pub party_code: String,
    pub agent_code: Option<String>,
    pub notes: String,
    pub date: Date,
    pub net: Decimal,
    pub tax: Decimal,
    pub withholding: Decimal,
    pub surcharge: Decimal,
    pub total: Decimal,
    pub entry_id: Option<Uuid>,
    pub payment_entry_id: Option<Uuid>,
    pub paid: bool,
    pub voided: bool,
    pub rectifies: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_lines::Entity")]
    InvoiceLines,
    #[sea_orm(has_many = "super::receipts::Entity")]
    Receipts,
    #[sea_orm(has_many = "super::delivery_notes::Entity")]
    DeliveryNotes,
}

impl Related<super::invoice_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceLines.def()
    }
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl Related<super::delivery_notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
