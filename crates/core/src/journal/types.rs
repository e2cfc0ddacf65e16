//! Journal entry and transaction types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AccountSetId, JournalEntryId, TransactionId};

use crate::account::Direction;

/// One debit/credit line of a journal entry, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Owning journal entry.
    pub journal_entry_id: JournalEntryId,
    /// Leaf account posted to.
    pub account_id: AccountId,
    /// Owning account set.
    pub account_set_id: AccountSetId,
    /// Day the line was first recorded.
    pub created_date: NaiveDate,
    /// Effective date of the line.
    pub modified_date: NaiveDate,
    /// Line description.
    pub description: String,
    /// Debit amount, 2 decimal places, never negative.
    pub debit: Decimal,
    /// Credit amount, 2 decimal places, never negative.
    pub credit: Decimal,
}

/// A balanced group of transactions, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning account set.
    pub account_set_id: AccountSetId,
    /// Day the entry was first recorded.
    pub created_date: NaiveDate,
    /// Effective date of the entry.
    pub modified_date: NaiveDate,
    /// Voucher label, e.g. "Rec" or "Transfer".
    pub voucher_word: String,
    /// Voucher number, unique within the entry's period.
    pub voucher_num: i32,
    /// Lines of the entry, in submission order.
    pub transaction_ids: Vec<TransactionId>,
}

/// Header of a journal entry as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Present for existing entries.
    pub id: Option<JournalEntryId>,
    /// Account set the entry belongs to.
    pub account_set_id: AccountSetId,
    /// Voucher label.
    pub voucher_word: String,
    /// Voucher number; assigned when absent.
    pub voucher_num: Option<i32>,
    /// Day the entry was first recorded; assigned by the processor.
    pub created_date: Option<NaiveDate>,
    /// Effective date; a new entry defaults to today, an existing one keeps its date.
    pub modified_date: Option<NaiveDate>,
}

/// One line of a journal entry as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    /// Present for existing lines.
    pub id: Option<TransactionId>,
    /// Leaf account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line description.
    pub description: String,
}

impl EntryLine {
    /// A new line booking `amount` on `side`.
    #[must_use]
    pub fn on_side(
        side: Direction,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        match side {
            Direction::Debit => Self::debit(account_id, amount, description),
            Direction::Credit => Self::credit(account_id, amount, description),
        }
    }

    /// A new debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            id: None,
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: description.into(),
        }
    }

    /// A new credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            id: None,
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: description.into(),
        }
    }
}

/// A journal entry with its lines, as submitted to and returned by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryView {
    /// Entry header.
    pub entry: EntryHeader,
    /// Entry lines.
    pub lines: Vec<EntryLine>,
}

impl JournalEntryView {
    /// Starts an empty new entry.
    #[must_use]
    pub fn new(account_set_id: AccountSetId, voucher_word: impl Into<String>) -> Self {
        Self {
            entry: EntryHeader {
                id: None,
                account_set_id,
                voucher_word: voucher_word.into(),
                voucher_num: None,
                created_date: None,
                modified_date: None,
            },
            lines: Vec::new(),
        }
    }

    /// Sets the effective date.
    #[must_use]
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.entry.modified_date = Some(date);
        self
    }

    /// Appends a line.
    #[must_use]
    pub fn line(mut self, line: EntryLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sum of debits minus sum of credits over all lines.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit - l.credit).sum()
    }

    /// Appends the line that brings the entry to balance against `account_id`.
    ///
    /// Does nothing when the entry already balances.
    pub fn push_balancing_line(&mut self, account_id: AccountId, description: &str) {
        let net = self.net();
        if net > Decimal::ZERO {
            self.lines.push(EntryLine::credit(account_id, net, description));
        } else if net < Decimal::ZERO {
            self.lines.push(EntryLine::debit(account_id, -net, description));
        }
    }

    /// Builds the view of a stored entry; lines follow `transaction_ids` order.
    #[must_use]
    pub fn from_stored(entry: &JournalEntry, transactions: &[Transaction]) -> Self {
        let lines = entry
            .transaction_ids
            .iter()
            .filter_map(|id| transactions.iter().find(|t| t.id == *id))
            .map(|t| EntryLine {
                id: Some(t.id),
                account_id: t.account_id,
                debit: t.debit,
                credit: t.credit,
                description: t.description.clone(),
            })
            .collect();

        Self {
            entry: EntryHeader {
                id: Some(entry.id),
                account_set_id: entry.account_set_id,
                voucher_word: entry.voucher_word.clone(),
                voucher_num: Some(entry.voucher_num),
                created_date: Some(entry.created_date),
                modified_date: Some(entry.modified_date),
            },
            lines,
        }
    }
}
