//! Persistent store boundary.
//!
//! The core reads through [`LedgerStore`] and never writes directly: every
//! mutating call stages its writes in a [`UnitOfWork`] and hands the resulting
//! [`ChangeSet`] to [`LedgerStore::commit`], which applies it atomically.
//! Accounting periods carry a version; a commit whose period version no
//! longer matches the stored one fails with [`StoreError::Conflict`].

mod memory;
mod unit_of_work;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use thiserror::Error;

use crate::account::{Account, AccountSet};
use crate::journal::{JournalEntry, Transaction};
use crate::period::AccountingPeriod;

pub use memory::MemoryStore;
pub use unit_of_work::UnitOfWork;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent writer changed a record this commit depends on.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backend failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Read and atomic-commit access to ledger records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Finds an account set by id.
    async fn account_set(&self, id: AccountSetId) -> Result<Option<AccountSet>, StoreError>;

    /// Finds an account set by its unique name.
    async fn account_set_by_name(&self, name: &str) -> Result<Option<AccountSet>, StoreError>;

    /// Finds an account by id.
    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lists every account of an account set.
    async fn accounts(&self, account_set_id: AccountSetId) -> Result<Vec<Account>, StoreError>;

    /// Finds a transaction by id.
    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Lists the transactions posted to an account.
    async fn transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Lists the transactions of a journal entry.
    async fn transactions_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Finds a journal entry by id.
    async fn journal_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Lists the entries of an account set dated within `[from, to]`.
    async fn journal_entries_between(
        &self,
        account_set_id: AccountSetId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// Finds an accounting period by id.
    async fn period(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, StoreError>;

    /// Lists the periods of an account set ordered by start date.
    async fn periods(
        &self,
        account_set_id: AccountSetId,
    ) -> Result<Vec<AccountingPeriod>, StoreError>;

    /// Applies every change atomically, or none of them.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}

/// Pending upserts and deletes for one record type.
#[derive(Debug, Clone)]
pub struct Staged<K, V> {
    /// Records to insert or replace.
    pub upserts: BTreeMap<K, V>,
    /// Keys to delete.
    pub deletes: BTreeSet<K>,
}

impl<K, V> Default for Staged<K, V> {
    fn default() -> Self {
        Self {
            upserts: BTreeMap::new(),
            deletes: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Copy, V: Clone> Staged<K, V> {
    /// Stages an insert or replace.
    pub fn put(&mut self, key: K, value: V) {
        self.deletes.remove(&key);
        self.upserts.insert(key, value);
    }

    /// Stages a delete.
    pub fn delete(&mut self, key: K) {
        self.upserts.remove(&key);
        self.deletes.insert(key);
    }

    /// `Some(Some(v))` if staged, `Some(None)` if deleted, `None` if untouched.
    pub fn lookup(&self, key: &K) -> Option<Option<&V>> {
        if self.deletes.contains(key) {
            Some(None)
        } else {
            self.upserts.get(key).map(Some)
        }
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    /// Merges staged changes over a list read from the store.
    ///
    /// Records staged for delete or replace are dropped from `base`, then
    /// every staged record matching `keep` is appended.
    pub fn overlay(&self, base: Vec<V>, key: impl Fn(&V) -> K, keep: impl Fn(&V) -> bool) -> Vec<V> {
        let mut merged: Vec<V> = base
            .into_iter()
            .filter(|v| {
                let k = key(v);
                !self.deletes.contains(&k) && !self.upserts.contains_key(&k)
            })
            .collect();
        merged.extend(self.upserts.values().filter(|v| keep(v)).cloned());
        merged
    }
}

/// Every write of one unit of work.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Account set inserts.
    pub account_sets: Staged<AccountSetId, AccountSet>,
    /// Account upserts and deletes.
    pub accounts: Staged<AccountId, Account>,
    /// Period upserts; `version` is the version read before the change.
    pub periods: Staged<AccountingPeriodId, AccountingPeriod>,
    /// Journal entry upserts and deletes.
    pub journal_entries: Staged<JournalEntryId, JournalEntry>,
    /// Transaction upserts and deletes.
    pub transactions: Staged<TransactionId, Transaction>,
}

/// Keys written by a change set, used for cache invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Touched {
    /// Account sets with any change.
    pub account_sets: BTreeSet<AccountSetId>,
    /// Accounts upserted or deleted.
    pub accounts: BTreeSet<AccountId>,
    /// Periods upserted.
    pub periods: BTreeSet<AccountingPeriodId>,
}

impl ChangeSet {
    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.account_sets.is_empty()
            && self.accounts.is_empty()
            && self.periods.is_empty()
            && self.journal_entries.is_empty()
            && self.transactions.is_empty()
    }

    /// Collects the keys this change set writes.
    ///
    /// Deleted accounts carry no account set here, so callers pass the
    /// account set the unit of work ran against, if any.
    pub fn touched(&self, account_set_id: Option<AccountSetId>) -> Touched {
        let mut touched = Touched::default();
        touched.account_sets.extend(account_set_id);
        touched.account_sets.extend(self.account_sets.upserts.keys().copied());
        touched.account_sets.extend(self.accounts.upserts.values().map(|a| a.account_set_id));
        touched.account_sets.extend(self.periods.upserts.values().map(|p| p.account_set_id));
        touched.accounts.extend(self.accounts.upserts.keys().copied());
        touched.accounts.extend(self.accounts.deletes.iter().copied());
        touched.periods.extend(self.periods.upserts.keys().copied());
        touched
    }
}
