//! Post-transfer checks run before a period is marked closed.

use rust_decimal::Decimal;

use super::category::TransferCategory;
use crate::account::{Account, AccountClass, Direction};
use crate::error::LedgerError;
use crate::journal::JournalEntry;
use crate::period::AccountingPeriod;

/// Every transferable leaf must be at zero.
pub fn verify_transfers(accounts: &[Account], period: &AccountingPeriod) -> Result<(), LedgerError> {
    for account in accounts
        .iter()
        .filter(|a| a.is_leaf && TransferCategory::of(a.account_type).is_some())
    {
        let balance = period.holder(account.id).balance;
        if !balance.is_zero() {
            return Err(LedgerError::TransferIncomplete {
                code: account.code.clone(),
                balance,
            });
        }
    }
    Ok(())
}

/// Difference between the debit-normal and credit-normal sides of the
/// accounting equation over level-1 accounts.
///
/// Assets and cost sit on the debit side; liabilities and equity on the
/// credit side. Each account is signed by its own direction.
#[must_use]
pub fn equation_difference(accounts: &[Account], period: &AccountingPeriod) -> Decimal {
    accounts
        .iter()
        .filter(|a| a.level == 1)
        .map(|account| {
            let balance = period.holder(account.id).balance;
            let debit_signed = match account.direction {
                Direction::Debit => balance,
                Direction::Credit => -balance,
            };
            match account.account_type.class() {
                AccountClass::Asset
                | AccountClass::Cost
                | AccountClass::Liability
                | AccountClass::Equity => debit_signed,
                AccountClass::ProfitAndLoss => Decimal::ZERO,
            }
        })
        .sum()
}

/// Assets plus cost must equal liabilities plus equity.
pub fn verify_equation(accounts: &[Account], period: &AccountingPeriod) -> Result<(), LedgerError> {
    let difference = equation_difference(accounts, period);
    if difference.is_zero() {
        Ok(())
    } else {
        Err(LedgerError::EquationImbalance(difference))
    }
}

/// Voucher numbers of the period's entries must run 1..=n with no gap.
pub fn verify_vouchers(entries: &[JournalEntry]) -> Result<(), LedgerError> {
    let mut numbers: Vec<i32> = entries.iter().map(|e| e.voucher_num).collect();
    numbers.sort_unstable();
    for (expected, found) in (1..).zip(numbers) {
        if expected != found {
            return Err(LedgerError::VoucherGap { expected, found });
        }
    }
    Ok(())
}
