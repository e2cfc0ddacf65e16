//! Standard small-business chart of accounts.
//!
//! Level-1 accounts only. Fed through the import path when seeding a new
//! account set; `3103` is the current year profit account used by closing.

use rust_decimal::Decimal;

use super::types::{AccountDraft, AccountType};

const STANDARD_CHART: &[(&str, &str, AccountType)] = &[
    ("1001", "Cash on Hand", AccountType::CurrentAsset),
    ("1002", "Bank Deposits", AccountType::CurrentAsset),
    ("1122", "Accounts Receivable", AccountType::CurrentAsset),
    ("1403", "Raw Materials", AccountType::CurrentAsset),
    ("1601", "Fixed Assets", AccountType::NonCurrentAsset),
    ("1602", "Accumulated Depreciation", AccountType::NonCurrentAsset),
    ("2001", "Short-term Borrowings", AccountType::CurrentLiability),
    ("2202", "Accounts Payable", AccountType::CurrentLiability),
    ("2211", "Payroll Payable", AccountType::CurrentLiability),
    ("2221", "Taxes Payable", AccountType::CurrentLiability),
    ("2501", "Long-term Borrowings", AccountType::NonCurrentLiability),
    ("3001", "Paid-in Capital", AccountType::Equity),
    ("3103", "Current Year Profit", AccountType::Equity),
    ("3104", "Profit Distribution", AccountType::Equity),
    ("4001", "Production Cost", AccountType::Cost),
    ("5001", "Main Business Revenue", AccountType::OperatingRevenue),
    ("5051", "Other Business Revenue", AccountType::OperatingRevenue),
    ("5301", "Non-operating Income", AccountType::OtherIncome),
    ("5401", "Main Business Cost", AccountType::OperatingCostTax),
    ("5403", "Business Taxes and Surcharges", AccountType::OperatingCostTax),
    ("5601", "Selling Expenses", AccountType::PeriodExpense),
    ("5602", "Administrative Expenses", AccountType::PeriodExpense),
    ("5603", "Financial Expenses", AccountType::PeriodExpense),
    ("5711", "Non-operating Expenses", AccountType::OtherExpense),
    ("5801", "Income Tax Expense", AccountType::IncomeTax),
    ("5901", "Prior Year Adjustment", AccountType::PriorYearAdjustment),
];

/// Drafts for the standard chart, with zero opening balances.
#[must_use]
pub fn standard_chart() -> Vec<AccountDraft> {
    STANDARD_CHART
        .iter()
        .map(|&(code, name, account_type)| AccountDraft {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            direction: account_type.default_direction(),
            initial_balance: Decimal::ZERO,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::code::resolve_level_and_validate;
    use crate::closing::CURRENT_YEAR_PROFIT_CODE;
    use std::collections::HashSet;

    #[test]
    fn test_standard_chart_is_valid_level_one() {
        let chart = standard_chart();
        let mut codes = HashSet::new();
        for draft in &chart {
            assert_eq!(resolve_level_and_validate(&draft.code, None).unwrap(), 1);
            assert!(codes.insert(draft.code.clone()), "duplicate {}", draft.code);
        }
        assert!(chart.iter().any(|d| d.code == CURRENT_YEAR_PROFIT_CODE));
    }
}
