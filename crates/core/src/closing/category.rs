//! Transfer categories for period closing.

use crate::account::AccountType;

/// Code of the current year profit account every transfer books against.
pub const CURRENT_YEAR_PROFIT_CODE: &str = "3103";

/// Voucher label of closing transfer entries.
pub const TRANSFER_VOUCHER_WORD: &str = "Transfer";

/// A group of temporary accounts zeroed by one transfer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCategory {
    /// Revenue and other income.
    Income,
    /// Operating cost and taxes, period expense, other expense, income tax.
    AllExpenseTypes,
    /// Prior-year profit and loss adjustment.
    PriorYearAdjustment,
}

impl TransferCategory {
    /// Every category, in transfer order.
    pub const ALL: [Self; 3] = [Self::Income, Self::AllExpenseTypes, Self::PriorYearAdjustment];

    /// Account types belonging to this category.
    #[must_use]
    pub fn account_types(self) -> &'static [AccountType] {
        match self {
            Self::Income => &[AccountType::OperatingRevenue, AccountType::OtherIncome],
            Self::AllExpenseTypes => &[
                AccountType::OperatingCostTax,
                AccountType::PeriodExpense,
                AccountType::OtherExpense,
                AccountType::IncomeTax,
            ],
            Self::PriorYearAdjustment => &[AccountType::PriorYearAdjustment],
        }
    }

    /// Returns true if accounts of `account_type` belong to this category.
    #[must_use]
    pub fn contains(self, account_type: AccountType) -> bool {
        self.account_types().contains(&account_type)
    }

    /// The category an account type is transferred under, if any.
    #[must_use]
    pub fn of(account_type: AccountType) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.contains(account_type))
    }

    /// Line description of transfers in this category.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Income => "Transfer income to current year profit",
            Self::AllExpenseTypes => "Transfer expenses to current year profit",
            Self::PriorYearAdjustment => "Transfer prior year adjustment to current year profit",
        }
    }
}
