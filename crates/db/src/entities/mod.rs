//! `SeaORM` entity definitions.

pub mod account_sets;
pub mod accounting_periods;
pub mod accounts;
pub mod journal_entries;
pub mod period_balances;
pub mod transactions;
