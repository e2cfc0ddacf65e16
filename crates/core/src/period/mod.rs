//! Period ledger.
//!
//! One accounting period per calendar month, each holding cumulative
//! debit/credit/balance totals per account.

pub mod calendar;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use calendar::{month_end, month_start, next_month_start, period_name};
pub use ledger::PeriodLedger;
pub use types::{AccountingPeriod, AmountHolder, BalanceField, BalanceRow};
