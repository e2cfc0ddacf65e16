//! Initial database migration.
//!
//! Creates the account set, chart of accounts, journal and period tables.
//! Foreign keys are deferred to commit time so a store commit can write
//! children before their parents within one transaction.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ACCOUNT_SETS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;
        db.execute_unprepared(PERIOD_BALANCES_SQL).await?;

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

const ACCOUNT_SETS_SQL: &str = r"
CREATE TABLE account_sets (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL UNIQUE,
    start_date DATE NOT NULL,
    description TEXT,
    created_date DATE NOT NULL,
    CONSTRAINT chk_account_set_name CHECK (length(trim(name)) > 0)
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    account_set_id UUID NOT NULL REFERENCES account_sets(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    code VARCHAR(14) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(32) NOT NULL,
    direction VARCHAR(8) NOT NULL,
    state VARCHAR(8) NOT NULL DEFAULT 'active',
    level SMALLINT NOT NULL,
    parent_id UUID REFERENCES accounts(id) DEFERRABLE INITIALLY DEFERRED,
    is_leaf BOOLEAN NOT NULL DEFAULT true,
    initial_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    CONSTRAINT chk_account_level CHECK (level BETWEEN 1 AND 4),
    CONSTRAINT chk_account_direction CHECK (direction IN ('debit', 'credit')),
    CONSTRAINT chk_account_state CHECK (state IN ('active', 'inactive')),
    UNIQUE (account_set_id, code)
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    account_set_id UUID NOT NULL REFERENCES account_sets(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    created_date DATE NOT NULL,
    modified_date DATE NOT NULL,
    voucher_word VARCHAR(50) NOT NULL,
    voucher_num INTEGER NOT NULL,
    transaction_ids JSONB NOT NULL DEFAULT '[]',
    CONSTRAINT chk_voucher_num CHECK (voucher_num > 0)
);

CREATE INDEX idx_journal_entries_set_date ON journal_entries(account_set_id, modified_date);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    account_id UUID NOT NULL REFERENCES accounts(id) DEFERRABLE INITIALLY DEFERRED,
    account_set_id UUID NOT NULL REFERENCES account_sets(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    created_date DATE NOT NULL,
    modified_date DATE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    debit NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 2) NOT NULL DEFAULT 0,
    CONSTRAINT chk_transaction_amounts CHECK (debit >= 0 AND credit >= 0)
);

CREATE INDEX idx_transactions_entry ON transactions(journal_entry_id);
CREATE INDEX idx_transactions_account ON transactions(account_id);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY,
    account_set_id UUID NOT NULL REFERENCES account_sets(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    name VARCHAR(20) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    closed BOOLEAN NOT NULL DEFAULT false,
    version BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    UNIQUE (account_set_id, start_date)
);
";

const PERIOD_BALANCES_SQL: &str = r"
CREATE TABLE period_balances (
    period_id UUID NOT NULL REFERENCES accounting_periods(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE
        DEFERRABLE INITIALLY DEFERRED,
    total_debit NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_credit NUMERIC(19, 2) NOT NULL DEFAULT 0,
    balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    PRIMARY KEY (period_id, account_id)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS period_balances;
DROP TABLE IF EXISTS accounting_periods;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS account_sets;
";
