//! Chart of accounts domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AccountSetId};

/// A tenant-scoped ledger: one chart of accounts, its periods and its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
    /// Unique identifier.
    pub id: AccountSetId,
    /// Display name, unique across account sets.
    pub name: String,
    /// First day of the first accounting period.
    pub start_date: NaiveDate,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Day the account set was opened.
    pub created_date: NaiveDate,
}

/// Accounting classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Current asset.
    CurrentAsset,
    /// Non-current asset.
    NonCurrentAsset,
    /// Current liability.
    CurrentLiability,
    /// Non-current liability.
    NonCurrentLiability,
    /// Owners' equity.
    Equity,
    /// Cost (production or service cost carried on the balance sheet).
    Cost,
    /// Operating revenue.
    OperatingRevenue,
    /// Other (non-operating) income.
    OtherIncome,
    /// Operating cost and business taxes.
    OperatingCostTax,
    /// Other (non-operating) expense.
    OtherExpense,
    /// Period expense (selling, administrative and financial).
    PeriodExpense,
    /// Income tax expense.
    IncomeTax,
    /// Prior-year profit and loss adjustment.
    PriorYearAdjustment,
}

/// Side of the accounting equation an account type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountClass {
    /// Assets.
    Asset,
    /// Liabilities.
    Liability,
    /// Equity.
    Equity,
    /// Cost.
    Cost,
    /// Temporary profit and loss accounts.
    ProfitAndLoss,
}

impl AccountType {
    /// Every account type, in chart order.
    pub const ALL: [Self; 13] = [
        Self::CurrentAsset,
        Self::NonCurrentAsset,
        Self::CurrentLiability,
        Self::NonCurrentLiability,
        Self::Equity,
        Self::Cost,
        Self::OperatingRevenue,
        Self::OtherIncome,
        Self::OperatingCostTax,
        Self::OtherExpense,
        Self::PeriodExpense,
        Self::IncomeTax,
        Self::PriorYearAdjustment,
    ];

    /// Returns the equation class of this type.
    #[must_use]
    pub fn class(self) -> AccountClass {
        match self {
            Self::CurrentAsset | Self::NonCurrentAsset => AccountClass::Asset,
            Self::CurrentLiability | Self::NonCurrentLiability => AccountClass::Liability,
            Self::Equity => AccountClass::Equity,
            Self::Cost => AccountClass::Cost,
            Self::OperatingRevenue
            | Self::OtherIncome
            | Self::OperatingCostTax
            | Self::OtherExpense
            | Self::PeriodExpense
            | Self::IncomeTax
            | Self::PriorYearAdjustment => AccountClass::ProfitAndLoss,
        }
    }

    /// Returns the usual balance direction for this type.
    #[must_use]
    pub fn default_direction(self) -> Direction {
        match self {
            Self::CurrentAsset
            | Self::NonCurrentAsset
            | Self::Cost
            | Self::OperatingCostTax
            | Self::OtherExpense
            | Self::PeriodExpense
            | Self::IncomeTax => Direction::Debit,
            Self::CurrentLiability
            | Self::NonCurrentLiability
            | Self::Equity
            | Self::OperatingRevenue
            | Self::OtherIncome
            | Self::PriorYearAdjustment => Direction::Credit,
        }
    }

    /// Returns the storage name of this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentAsset => "current_asset",
            Self::NonCurrentAsset => "non_current_asset",
            Self::CurrentLiability => "current_liability",
            Self::NonCurrentLiability => "non_current_liability",
            Self::Equity => "equity",
            Self::Cost => "cost",
            Self::OperatingRevenue => "operating_revenue",
            Self::OtherIncome => "other_income",
            Self::OperatingCostTax => "operating_cost_tax",
            Self::OtherExpense => "other_expense",
            Self::PeriodExpense => "period_expense",
            Self::IncomeTax => "income_tax",
            Self::PriorYearAdjustment => "prior_year_adjustment",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown account type: {s}"))
    }
}

/// Balance-normal direction of an account.
///
/// - Debit-normal: balance += debit - credit
/// - Credit-normal: balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl Direction {
    /// Calculates the balance change for a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Returns the other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the storage name of this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown direction: {s}")),
        }
    }
}

/// Whether an account can be used in new entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    /// Usable.
    #[default]
    Active,
    /// Kept for history only.
    Inactive,
}

impl AccountState {
    /// Returns the storage name of this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for AccountState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown account state: {s}")),
        }
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning account set.
    pub account_set_id: AccountSetId,
    /// Hierarchical code; its length fixes the level.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Accounting classification.
    pub account_type: AccountType,
    /// Balance-normal direction.
    pub direction: Direction,
    /// Active or inactive.
    pub state: AccountState,
    /// Depth in the tree, 1..=4.
    pub level: u8,
    /// Parent account, `None` for level 1.
    pub parent_id: Option<AccountId>,
    /// True when no account lists this one as parent.
    pub is_leaf: bool,
    /// Opening balance, rounded to 2 decimal places.
    pub initial_balance: Decimal,
}

impl Account {
    /// Returns true if the account can receive new entries.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == AccountState::Active
    }

    /// Case-insensitive match against the name or the code.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.code.contains(&query)
            || self.name.to_lowercase().contains(&query)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Hierarchical code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Accounting classification.
    pub account_type: AccountType,
    /// Balance direction; defaults to the parent's, else the type's usual one.
    pub direction: Option<Direction>,
    /// Explicit level, checked against the code length.
    pub level: Option<u8>,
    /// Explicit parent, checked against the code prefix.
    pub parent_id: Option<AccountId>,
    /// Opening balance.
    pub initial_balance: Decimal,
}

impl NewAccount {
    /// Creates an input with only the required fields set.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            direction: None,
            level: None,
            parent_id: None,
            initial_balance: Decimal::ZERO,
        }
    }

    /// Sets the opening balance.
    #[must_use]
    pub fn with_initial_balance(mut self, amount: Decimal) -> Self {
        self.initial_balance = amount;
        self
    }

    /// Sets the balance direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Partial update of an account; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New type.
    pub account_type: Option<AccountType>,
    /// New direction.
    pub direction: Option<Direction>,
    /// New state.
    pub state: Option<AccountState>,
}

/// A candidate account from a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    /// Hierarchical code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Accounting classification.
    pub account_type: AccountType,
    /// Balance direction.
    pub direction: Direction,
    /// Opening balance.
    #[serde(default)]
    pub initial_balance: Decimal,
}

impl From<AccountDraft> for NewAccount {
    fn from(draft: AccountDraft) -> Self {
        Self {
            code: draft.code,
            name: draft.name,
            account_type: draft.account_type,
            direction: Some(draft.direction),
            level: None,
            parent_id: None,
            initial_balance: draft.initial_balance,
        }
    }
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Accounts created by the import.
    pub created: Vec<Account>,
    /// Drafts whose code already existed, mapped to the existing account.
    pub reconciled: Vec<(String, AccountId)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_direction_balance_change() {
        assert_eq!(Direction::Debit.balance_change(dec!(100), dec!(30)), dec!(70));
        assert_eq!(Direction::Credit.balance_change(dec!(100), dec!(30)), dec!(-70));
        assert_eq!(Direction::Debit.opposite(), Direction::Credit);
    }

    #[test]
    fn test_account_type_roundtrip_names() {
        for account_type in AccountType::ALL {
            assert_eq!(AccountType::from_str(account_type.as_str()), Ok(account_type));
        }
        assert!(AccountType::from_str("asset").is_err());
    }

    #[test]
    fn test_account_type_classes() {
        assert_eq!(AccountType::NonCurrentAsset.class(), AccountClass::Asset);
        assert_eq!(AccountType::Cost.class(), AccountClass::Cost);
        assert_eq!(AccountType::IncomeTax.class(), AccountClass::ProfitAndLoss);
        assert_eq!(AccountType::OperatingRevenue.default_direction(), Direction::Credit);
        assert_eq!(AccountType::PeriodExpense.default_direction(), Direction::Debit);
    }

    #[test]
    fn test_account_matches_name_or_code() {
        let account = Account {
            id: AccountId::new(),
            account_set_id: AccountSetId::new(),
            code: "1002".to_string(),
            name: "Bank Deposits".to_string(),
            account_type: AccountType::CurrentAsset,
            direction: Direction::Debit,
            state: AccountState::Active,
            level: 1,
            parent_id: None,
            is_leaf: true,
            initial_balance: Decimal::ZERO,
        };
        assert!(account.matches("100"));
        assert!(account.matches("bank"));
        assert!(account.matches("  DEPOSITS "));
        assert!(!account.matches("cash"));
    }
}
