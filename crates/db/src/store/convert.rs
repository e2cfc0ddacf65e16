//! Conversions between `SeaORM` models and core ledger types.

use std::collections::BTreeMap;
use std::str::FromStr;

use sea_orm::ActiveValue::Set;
use tally_core::account::{Account, AccountSet, AccountState, AccountType, Direction};
use tally_core::journal::{JournalEntry, Transaction};
use tally_core::period::{AccountingPeriod, AmountHolder};
use tally_core::store::StoreError;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use uuid::Uuid;

use crate::entities::{
    account_sets, accounting_periods, accounts, journal_entries, period_balances, transactions,
};

fn corrupt(table: &str, id: Uuid, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{table} {id}: {detail}"))
}

pub(crate) fn account_set_from_model(model: account_sets::Model) -> AccountSet {
    AccountSet {
        id: AccountSetId::from_uuid(model.id),
        name: model.name,
        start_date: model.start_date,
        description: model.description,
        created_date: model.created_date,
    }
}

pub(crate) fn account_set_to_active(set: &AccountSet) -> account_sets::ActiveModel {
    account_sets::ActiveModel {
        id: Set(set.id.into_inner()),
        name: Set(set.name.clone()),
        start_date: Set(set.start_date),
        description: Set(set.description.clone()),
        created_date: Set(set.created_date),
    }
}

pub(crate) fn account_from_model(model: accounts::Model) -> Result<Account, StoreError> {
    let id = model.id;
    Ok(Account {
        id: AccountId::from_uuid(model.id),
        account_set_id: AccountSetId::from_uuid(model.account_set_id),
        account_type: AccountType::from_str(&model.account_type)
            .map_err(|e| corrupt("account", id, e))?,
        direction: Direction::from_str(&model.direction).map_err(|e| corrupt("account", id, e))?,
        state: AccountState::from_str(&model.state).map_err(|e| corrupt("account", id, e))?,
        level: u8::try_from(model.level).map_err(|e| corrupt("account", id, e))?,
        code: model.code,
        name: model.name,
        parent_id: model.parent_id.map(AccountId::from_uuid),
        is_leaf: model.is_leaf,
        initial_balance: model.initial_balance,
    })
}

pub(crate) fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        account_set_id: Set(account.account_set_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        direction: Set(account.direction.as_str().to_string()),
        state: Set(account.state.as_str().to_string()),
        level: Set(i16::from(account.level)),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        is_leaf: Set(account.is_leaf),
        initial_balance: Set(account.initial_balance),
    }
}

pub(crate) fn transaction_from_model(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        journal_entry_id: JournalEntryId::from_uuid(model.journal_entry_id),
        account_id: AccountId::from_uuid(model.account_id),
        account_set_id: AccountSetId::from_uuid(model.account_set_id),
        created_date: model.created_date,
        modified_date: model.modified_date,
        description: model.description,
        debit: model.debit,
        credit: model.credit,
    }
}

pub(crate) fn transaction_to_active(transaction: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        journal_entry_id: Set(transaction.journal_entry_id.into_inner()),
        account_id: Set(transaction.account_id.into_inner()),
        account_set_id: Set(transaction.account_set_id.into_inner()),
        created_date: Set(transaction.created_date),
        modified_date: Set(transaction.modified_date),
        description: Set(transaction.description.clone()),
        debit: Set(transaction.debit),
        credit: Set(transaction.credit),
    }
}

pub(crate) fn entry_from_model(model: journal_entries::Model) -> Result<JournalEntry, StoreError> {
    let transaction_ids: Vec<TransactionId> = serde_json::from_value(model.transaction_ids)
        .map_err(|e| corrupt("journal entry", model.id, e))?;
    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        account_set_id: AccountSetId::from_uuid(model.account_set_id),
        created_date: model.created_date,
        modified_date: model.modified_date,
        voucher_word: model.voucher_word,
        voucher_num: model.voucher_num,
        transaction_ids,
    })
}

pub(crate) fn entry_to_active(
    entry: &JournalEntry,
) -> Result<journal_entries::ActiveModel, StoreError> {
    let transaction_ids = serde_json::to_value(&entry.transaction_ids)
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        account_set_id: Set(entry.account_set_id.into_inner()),
        created_date: Set(entry.created_date),
        modified_date: Set(entry.modified_date),
        voucher_word: Set(entry.voucher_word.clone()),
        voucher_num: Set(entry.voucher_num),
        transaction_ids: Set(transaction_ids),
    })
}

/// Assembles a period from its row and its balance rows.
pub(crate) fn period_from_models(
    model: accounting_periods::Model,
    balances: Vec<period_balances::Model>,
) -> AccountingPeriod {
    let holders: BTreeMap<AccountId, AmountHolder> = balances
        .into_iter()
        .map(|b| {
            (
                AccountId::from_uuid(b.account_id),
                AmountHolder {
                    total_debit: b.total_debit,
                    total_credit: b.total_credit,
                    balance: b.balance,
                },
            )
        })
        .collect();

    AccountingPeriod {
        id: AccountingPeriodId::from_uuid(model.id),
        account_set_id: AccountSetId::from_uuid(model.account_set_id),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        closed: model.closed,
        version: model.version,
        holders,
    }
}

pub(crate) fn period_to_active(period: &AccountingPeriod) -> accounting_periods::ActiveModel {
    accounting_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        account_set_id: Set(period.account_set_id.into_inner()),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        closed: Set(period.closed),
        version: Set(period.version),
    }
}

pub(crate) fn balances_to_active(period: &AccountingPeriod) -> Vec<period_balances::ActiveModel> {
    period
        .holders
        .iter()
        .map(|(account_id, holder)| period_balances::ActiveModel {
            period_id: Set(period.id.into_inner()),
            account_id: Set(account_id.into_inner()),
            total_debit: Set(holder.total_debit),
            total_credit: Set(holder.total_credit),
            balance: Set(holder.balance),
        })
        .collect()
}
