//! Accounting period types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AccountSetId, AccountingPeriodId};

use super::calendar::{month_end, month_start, period_name};
use crate::account::{Account, Direction};

/// Cumulative totals of one account in one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountHolder {
    /// Cumulative debit total.
    pub total_debit: Decimal,
    /// Cumulative credit total.
    pub total_credit: Decimal,
    /// Cumulative balance, including the opening balance.
    pub balance: Decimal,
}

impl AmountHolder {
    /// Adds a debit/credit delta, moving the balance per `direction`.
    pub fn apply(&mut self, direction: Direction, debit: Decimal, credit: Decimal) {
        self.total_debit += debit;
        self.total_credit += credit;
        self.balance += direction.balance_change(debit, credit);
    }
}

/// One calendar month of an account set's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: AccountingPeriodId,
    /// Owning account set.
    pub account_set_id: AccountSetId,
    /// Month name, e.g. `2024-05`.
    pub name: String,
    /// First day of the month.
    pub start_date: NaiveDate,
    /// Last day of the month.
    pub end_date: NaiveDate,
    /// Whether the period has been closed.
    pub closed: bool,
    /// Optimistic concurrency version, bumped on every stored update.
    pub version: i64,
    /// Cumulative totals per account.
    pub holders: BTreeMap<AccountId, AmountHolder>,
}

impl AccountingPeriod {
    /// Creates an open period for the month containing `date`.
    #[must_use]
    pub fn for_month(
        account_set_id: AccountSetId,
        date: NaiveDate,
        holders: BTreeMap<AccountId, AmountHolder>,
    ) -> Self {
        Self {
            id: AccountingPeriodId::new(),
            account_set_id,
            name: period_name(date),
            start_date: month_start(date),
            end_date: month_end(date),
            closed: false,
            version: 0,
            holders,
        }
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns the holder for an account, zero when the account was never touched.
    #[must_use]
    pub fn holder(&self, account_id: AccountId) -> AmountHolder {
        self.holders.get(&account_id).copied().unwrap_or_default()
    }
}

/// Columns of a raw balance row, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceField {
    /// Account code.
    Code,
    /// Account name.
    Name,
    /// Account level.
    Level,
    /// Cumulative debit total.
    TotalDebit,
    /// Cumulative credit total.
    TotalCredit,
    /// Cumulative balance.
    Balance,
}

impl BalanceField {
    /// Every field, in display order.
    pub const ALL: [Self; 6] = [
        Self::Code,
        Self::Name,
        Self::Level,
        Self::TotalDebit,
        Self::TotalCredit,
        Self::Balance,
    ];

    /// Column header.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Level => "level",
            Self::TotalDebit => "total_debit",
            Self::TotalCredit => "total_credit",
            Self::Balance => "balance",
        }
    }
}

/// Raw balance of one account in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Account id.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account level.
    pub level: u8,
    /// Cumulative debit total.
    pub total_debit: Decimal,
    /// Cumulative credit total.
    pub total_credit: Decimal,
    /// Cumulative balance.
    pub balance: Decimal,
}

impl BalanceRow {
    /// Builds the row for an account from a period's holders.
    #[must_use]
    pub fn new(account: &Account, period: &AccountingPeriod) -> Self {
        let holder = period.holder(account.id);
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            level: account.level,
            total_debit: holder.total_debit,
            total_credit: holder.total_credit,
            balance: holder.balance,
        }
    }

    /// Renders one field as text.
    #[must_use]
    pub fn field(&self, field: BalanceField) -> String {
        match field {
            BalanceField::Code => self.code.clone(),
            BalanceField::Name => self.name.clone(),
            BalanceField::Level => self.level.to_string(),
            BalanceField::TotalDebit => self.total_debit.to_string(),
            BalanceField::TotalCredit => self.total_credit.to_string(),
            BalanceField::Balance => self.balance.to_string(),
        }
    }

    /// Renders every field in display order.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        BalanceField::ALL.iter().map(|&f| self.field(f)).collect()
    }
}
