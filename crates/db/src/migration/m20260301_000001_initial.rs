//! Initial database migration.
//!
//! Creates the ledger tables and enums. Balances are maintained by the
//! posting engine inside each transaction, so there are no balance triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES & CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: POSTING RULES
        // ============================================================
        db.execute_unprepared(POSTING_RULES_SQL).await?;

        // ============================================================
        // PART 4: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_SEQUENCES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 5: BALANCES & AUDIT
        // ============================================================
        db.execute_unprepared(PERIOD_BALANCES_SQL).await?;
        db.execute_unprepared(RULE_USAGE_LOGS_SQL).await?;

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

const ENUMS_SQL: &str = r"
-- Account types
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'income',
    'expense'
);

-- Side that increases an account
CREATE TYPE normal_balance AS ENUM ('debit', 'credit');

-- Journal entry lifecycle
CREATE TYPE journal_status AS ENUM (
    'draft',
    'pending_approval',
    'posted',
    'reversed',
    'cancelled'
);

-- Subledger parties
CREATE TYPE subledger_kind AS ENUM ('customer', 'vendor', 'employee');

-- Rule match outcomes
CREATE TYPE usage_outcome AS ENUM (
    'matched',
    'fallback_used',
    'no_rule_matched',
    'failed'
);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    base_currency CHAR(3) NOT NULL DEFAULT 'INR',
    fiscal_year_start_month INTEGER NOT NULL DEFAULT 4,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_fiscal_start_month CHECK (fiscal_year_start_month BETWEEN 1 AND 12)
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    normal_balance normal_balance NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    depth INTEGER NOT NULL DEFAULT 0,
    path TEXT NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_suspense BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_code UNIQUE (company_id, code),
    CONSTRAINT chk_depth_non_negative CHECK (depth >= 0)
);

CREATE INDEX idx_accounts_company ON accounts(company_id, depth, code);
CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const POSTING_RULES_SQL: &str = r"
CREATE TABLE posting_rules (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    code VARCHAR(100) NOT NULL,
    version INTEGER NOT NULL,
    source_type VARCHAR(100) NOT NULL,
    trigger_event VARCHAR(100) NOT NULL,
    description TEXT,
    condition JSONB NOT NULL,
    template JSONB NOT NULL,
    priority INTEGER NOT NULL DEFAULT 100,
    effective_from DATE NOT NULL,
    effective_to DATE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_fallback BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_posting_rules_version UNIQUE (company_id, code, version),
    CONSTRAINT chk_rule_version_positive CHECK (version >= 1),
    CONSTRAINT chk_rule_window CHECK (effective_to IS NULL OR effective_to >= effective_from)
);

CREATE INDEX idx_posting_rules_lookup
    ON posting_rules(company_id, source_type, priority)
    WHERE is_active = true;
";

const JOURNAL_SEQUENCES_SQL: &str = r"
CREATE TABLE journal_sequences (
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    fiscal_year INTEGER NOT NULL,
    last_value BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (company_id, fiscal_year)
);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    journal_number VARCHAR(50) NOT NULL,
    fiscal_year INTEGER NOT NULL,
    entry_date DATE NOT NULL,
    source_type VARCHAR(100) NOT NULL,
    source_id VARCHAR(255) NOT NULL,
    source_number VARCHAR(100),
    trigger_event VARCHAR(100),
    rule_id UUID REFERENCES posting_rules(id),
    status journal_status NOT NULL DEFAULT 'draft',
    total_debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    narration TEXT,
    needs_reclassification BOOLEAN NOT NULL DEFAULT false,
    reversal_of UUID REFERENCES journal_entries(id),
    reversed_by UUID REFERENCES journal_entries(id),
    reversal_reason TEXT,
    cancellation_reason TEXT,
    posted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_journal_number UNIQUE (company_id, journal_number),
    CONSTRAINT chk_exchange_rate_positive CHECK (exchange_rate > 0),
    CONSTRAINT chk_reversal_status CHECK (reversed_by IS NULL OR status = 'reversed')
);

-- Idempotency key: one live entry per source document
CREATE UNIQUE INDEX uq_journal_entries_source
    ON journal_entries(company_id, source_type, source_id)
    WHERE status <> 'cancelled';

-- At most one reversal per entry
CREATE UNIQUE INDEX uq_journal_entries_reversal_of
    ON journal_entries(reversal_of)
    WHERE reversal_of IS NOT NULL;

CREATE INDEX idx_journal_entries_company_date ON journal_entries(company_id, entry_date);
CREATE INDEX idx_journal_entries_status ON journal_entries(company_id, status);
CREATE INDEX idx_journal_entries_reclass
    ON journal_entries(company_id)
    WHERE needs_reclassification = true;
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    account_code VARCHAR(50) NOT NULL,
    debit_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    subledger_kind subledger_kind,
    subledger_id VARCHAR(255),
    memo VARCHAR(500),
    CONSTRAINT uq_journal_line_number UNIQUE (entry_id, line_number),
    CONSTRAINT chk_debit_xor_credit CHECK (
        (debit_amount > 0 AND credit_amount = 0) OR (debit_amount = 0 AND credit_amount > 0)
    ),
    CONSTRAINT chk_subledger_pair CHECK ((subledger_kind IS NULL) = (subledger_id IS NULL))
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const PERIOD_BALANCES_SQL: &str = r"
CREATE TABLE period_balances (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    fiscal_year INTEGER NOT NULL,
    period_month INTEGER NOT NULL,
    opening NUMERIC(19, 4) NOT NULL DEFAULT 0,
    period_debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    period_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    closing NUMERIC(19, 4) NOT NULL DEFAULT 0,
    CONSTRAINT uq_period_balance UNIQUE (account_id, fiscal_year, period_month),
    CONSTRAINT chk_period_month CHECK (period_month BETWEEN 1 AND 12)
);

CREATE INDEX idx_period_balances_company ON period_balances(company_id);
";

const RULE_USAGE_LOGS_SQL: &str = r"
CREATE TABLE rule_usage_logs (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    rule_id UUID REFERENCES posting_rules(id),
    rule_code VARCHAR(100),
    rule_version INTEGER,
    rule_snapshot JSONB,
    journal_entry_id UUID REFERENCES journal_entries(id),
    source_type VARCHAR(100) NOT NULL,
    source_id VARCHAR(255) NOT NULL,
    trigger_event VARCHAR(100) NOT NULL,
    outcome usage_outcome NOT NULL,
    error_message TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_rule_usage_company ON rule_usage_logs(company_id, created_at DESC);
CREATE INDEX idx_rule_usage_source ON rule_usage_logs(company_id, source_type, source_id);
";

const DROP_ALL_SQL: &str = r"
-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS rule_usage_logs CASCADE;
DROP TABLE IF EXISTS period_balances CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS journal_sequences CASCADE;
DROP TABLE IF EXISTS posting_rules CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

-- Drop enums
DROP TYPE IF EXISTS usage_outcome CASCADE;
DROP TYPE IF EXISTS subledger_kind CASCADE;
DROP TYPE IF EXISTS journal_status CASCADE;
DROP TYPE IF EXISTS normal_balance CASCADE;
DROP TYPE IF EXISTS account_type CASCADE;
";
