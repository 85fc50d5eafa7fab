//! `SeaORM` entity definitions.

pub mod delivery_notes;
pub mod entry_sequences;
pub mod fiscal_years;
pub mod invoice_lines;
pub mod invoices;
pub mod journal_entries;
pub mod ledger_lines;
pub mod receipts;
pub mod subaccounts;
pub mod tax_periods;
