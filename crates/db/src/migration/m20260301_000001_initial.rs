//! Initial database migration.
//!
//! Creates the accounting tables: fiscal years, tax regularization periods,
//! sub-accounts, journal entries, ledger lines, entry sequences, invoices,
//! invoice lines, receipts, and delivery notes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: FISCAL PERIOD MANAGEMENT
        // ============================================================
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;
        db.execute_unprepared(TAX_PERIODS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(SUBACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(LEDGER_LINES_SQL).await?;
        db.execute_unprepared(ENTRY_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 3: INVOICING
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(INVOICE_LINES_SQL).await?;
        db.execute_unprepared(RECEIPTS_SQL).await?;
        db.execute_unprepared(DELIVERY_NOTES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    code VARCHAR(4) PRIMARY KEY,
    company_id UUID NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status VARCHAR(10) NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'closed')),
    opening_entry_id UUID,
    closing_entry_id UUID,
    profit_loss_entry_id UUID,
    subaccount_code_length SMALLINT NOT NULL DEFAULT 10,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (start_date <= end_date)
);

CREATE INDEX idx_fiscal_years_company_range
    ON fiscal_years (company_id, start_date, end_date);
";

const TAX_PERIODS_SQL: &str = r"
CREATE TABLE tax_periods (
    id UUID PRIMARY KEY,
    year_code VARCHAR(4) NOT NULL REFERENCES fiscal_years(code),
    period VARCHAR(3) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    creditor_subaccount_id UUID,
    debtor_subaccount_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (start_date <= end_date)
);

CREATE INDEX idx_tax_periods_year ON tax_periods (year_code, start_date);
";

const SUBACCOUNTS_SQL: &str = r"
CREATE TABLE subaccounts (
    id UUID PRIMARY KEY,
    code VARCHAR(15) NOT NULL,
    year_code VARCHAR(4) NOT NULL REFERENCES fiscal_years(code),
    account_code VARCHAR(10) NOT NULL,
    currency CHAR(3) NOT NULL DEFAULT 'EUR',
    tax_code VARCHAR(10),
    debit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (year_code, code)
);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    number BIGINT NOT NULL,
    year_code VARCHAR(4) NOT NULL REFERENCES fiscal_years(code),
    date DATE NOT NULL,
    concept TEXT NOT NULL DEFAULT '',
    editable BOOLEAN NOT NULL DEFAULT TRUE,
    document_type VARCHAR(20),
    document_code VARCHAR(20),
    amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- Deferred so renumbering can shuffle numbers within one transaction.
    UNIQUE (year_code, number) DEFERRABLE INITIALLY DEFERRED
);

CREATE INDEX idx_journal_entries_year_date ON journal_entries (year_code, date, id);
CREATE INDEX idx_journal_entries_document
    ON journal_entries (document_type, document_code);
";

const LEDGER_LINES_SQL: &str = r"
CREATE TABLE ledger_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id),
    subaccount_id UUID NOT NULL REFERENCES subaccounts(id),
    subaccount_code VARCHAR(15) NOT NULL,
    counter_subaccount_id UUID,
    counter_subaccount_code VARCHAR(15),
    debit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL DEFAULT 'EUR',
    conversion_rate NUMERIC(14, 6) NOT NULL DEFAULT 1,
    document_type VARCHAR(20),
    document_code VARCHAR(20),
    tax_id VARCHAR(20),
    vat_base NUMERIC(14, 2) NOT NULL DEFAULT 0,
    vat_rate NUMERIC(6, 2) NOT NULL DEFAULT 0,
    surcharge_rate NUMERIC(6, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (debit = 0 OR credit = 0)
);

CREATE INDEX idx_ledger_lines_entry ON ledger_lines (entry_id);
CREATE INDEX idx_ledger_lines_subaccount ON ledger_lines (subaccount_id);
";

const ENTRY_SEQUENCES_SQL: &str = r"
CREATE TABLE entry_sequences (
    year_code VARCHAR(4) PRIMARY KEY REFERENCES fiscal_years(code),
    next_number BIGINT NOT NULL DEFAULT 1,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    kind VARCHAR(20) NOT NULL
        CHECK (kind IN ('customer_invoice', 'supplier_invoice')),
    year_code VARCHAR(4) NOT NULL REFERENCES fiscal_years(code),
    series VARCHAR(4) NOT NULL,
    number BIGINT NOT NULL,
    party_code VARCHAR(10) NOT NULL,
    agent_code VARCHAR(10),
    notes TEXT NOT NULL DEFAULT '',
    date DATE NOT NULL,
    net NUMERIC(14, 2) NOT NULL DEFAULT 0,
    tax NUMERIC(14, 2) NOT NULL DEFAULT 0,
    withholding NUMERIC(14, 2) NOT NULL DEFAULT 0,
    surcharge NUMERIC(14, 2) NOT NULL DEFAULT 0,
    total NUMERIC(14, 2) NOT NULL DEFAULT 0,
    entry_id UUID,
    payment_entry_id UUID,
    paid BOOLEAN NOT NULL DEFAULT FALSE,
    voided BOOLEAN NOT NULL DEFAULT FALSE,
    rectifies UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (kind, year_code, series, number)
);

CREATE INDEX idx_invoices_date ON invoices (kind, date);
CREATE INDEX idx_invoices_entry ON invoices (entry_id);
CREATE INDEX idx_invoices_payment_entry ON invoices (payment_entry_id);
";

const INVOICE_LINES_SQL: &str = r"
CREATE TABLE invoice_lines (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    reference VARCHAR(30),
    description TEXT NOT NULL DEFAULT '',
    quantity NUMERIC(12, 4) NOT NULL DEFAULT 1,
    net NUMERIC(14, 2) NOT NULL DEFAULT 0,
    vat_rate NUMERIC(6, 2) NOT NULL DEFAULT 0,
    surcharge_rate NUMERIC(6, 2) NOT NULL DEFAULT 0,
    withholding_rate NUMERIC(6, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_invoice_lines_invoice ON invoice_lines (invoice_id);
";

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id),
    number INTEGER NOT NULL,
    amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    due_date DATE NOT NULL,
    paid BOOLEAN NOT NULL DEFAULT FALSE,
    paid_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (invoice_id, number)
);
";

const DELIVERY_NOTES_SQL: &str = r"
CREATE TABLE delivery_notes (
    id UUID PRIMARY KEY,
    invoice_id UUID REFERENCES invoices(id),
    pending BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_delivery_notes_invoice ON delivery_notes (invoice_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS delivery_notes;
DROP TABLE IF EXISTS receipts;
DROP TABLE IF EXISTS invoice_lines;
DROP TABLE IF EXISTS invoices;
DROP TABLE IF EXISTS entry_sequences;
DROP TABLE IF EXISTS ledger_lines;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS subaccounts;
DROP TABLE IF EXISTS tax_periods;
DROP TABLE IF EXISTS fiscal_years;
";
