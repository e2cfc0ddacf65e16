//! Auto-entry templates.
//!
//! A template reads figures from the period ledger (a debit total, a credit
//! total or a balance per account) and books them against one "other side"
//! account, e.g. moving the balance of raw materials into production cost.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AccountSetId};

use super::types::{EntryLine, JournalEntryView};
use crate::account::Direction;
use crate::error::LedgerError;
use crate::period::{AccountingPeriod, AmountHolder};

/// Which figure of an account's holder a template line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateDataType {
    /// Cumulative debit total.
    DebitTotal,
    /// Cumulative credit total.
    CreditTotal,
    /// Cumulative balance.
    Balance,
}

impl TemplateDataType {
    /// Reads this figure from a holder.
    #[must_use]
    pub fn read(self, holder: &AmountHolder) -> Decimal {
        match self {
            Self::DebitTotal => holder.total_debit,
            Self::CreditTotal => holder.total_credit,
            Self::Balance => holder.balance,
        }
    }
}

/// One source line of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOperation {
    /// Account whose figure is read and posted to.
    pub account_id: AccountId,
    /// Figure to read.
    pub data_type: TemplateDataType,
}

/// A reusable recipe for a recurring journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoEntryTemplate {
    /// Template name.
    pub name: String,
    /// Voucher label for generated entries.
    pub voucher_word: String,
    /// Description stamped on every generated line.
    pub description: String,
    /// Side the offsetting account is booked on.
    pub other_side: Direction,
    /// Offsetting account.
    pub other_side_account_id: AccountId,
    /// Source lines.
    pub operations: Vec<TemplateOperation>,
}

impl AutoEntryTemplate {
    /// Builds an entry dated `date` from the figures in `period`.
    ///
    /// Source lines go opposite `other_side`; a negative figure flips to the
    /// other side. Zero figures are skipped. The offsetting line takes the net.
    pub fn build(
        &self,
        account_set_id: AccountSetId,
        period: &AccountingPeriod,
        date: NaiveDate,
    ) -> Result<JournalEntryView, LedgerError> {
        let mut view = JournalEntryView::new(account_set_id, self.voucher_word.clone()).dated(date);
        let source_side = self.other_side.opposite();

        for operation in &self.operations {
            let amount = operation.data_type.read(&period.holder(operation.account_id));
            if amount.is_zero() {
                continue;
            }
            let (side, amount) = if amount < Decimal::ZERO {
                (source_side.opposite(), -amount)
            } else {
                (source_side, amount)
            };
            view.lines.push(EntryLine::on_side(
                side,
                operation.account_id,
                amount,
                self.description.clone(),
            ));
        }

        if view.lines.is_empty() {
            return Err(LedgerError::NoLines);
        }
        view.push_balancing_line(self.other_side_account_id, &self.description);
        Ok(view)
    }
}
