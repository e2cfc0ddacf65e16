//! In-memory store.
//!
//! Holds every table behind one async `RwLock`; a commit validates period
//! versions and applies the whole change set under a single write guard.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use tokio::sync::RwLock;

use super::{ChangeSet, LedgerStore, StoreError};
use crate::account::{Account, AccountSet};
use crate::journal::{JournalEntry, Transaction};
use crate::period::AccountingPeriod;

#[derive(Debug, Default)]
struct Tables {
    account_sets: BTreeMap<AccountSetId, AccountSet>,
    accounts: BTreeMap<AccountId, Account>,
    transactions: BTreeMap<TransactionId, Transaction>,
    journal_entries: BTreeMap<JournalEntryId, JournalEntry>,
    periods: BTreeMap<AccountingPeriodId, AccountingPeriod>,
}

impl Tables {
    fn check(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        for set in changes.account_sets.upserts.values() {
            if self
                .account_sets
                .values()
                .any(|s| s.name == set.name && s.id != set.id)
            {
                return Err(StoreError::Conflict(format!("account set name {}", set.name)));
            }
        }

        for period in changes.periods.upserts.values() {
            match self.periods.get(&period.id) {
                Some(stored) if stored.version != period.version => {
                    return Err(StoreError::Conflict(format!(
                        "period {} expected version {}, found {}",
                        period.id, period.version, stored.version
                    )));
                }
                Some(_) => {}
                None => {
                    if self.periods.values().any(|p| {
                        p.account_set_id == period.account_set_id
                            && p.start_date == period.start_date
                    }) {
                        return Err(StoreError::Conflict(format!(
                            "period {} already exists",
                            period.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, changes: ChangeSet) {
        self.account_sets.extend(changes.account_sets.upserts);

        for id in &changes.accounts.deletes {
            self.accounts.remove(id);
        }
        self.accounts.extend(changes.accounts.upserts);

        for mut period in changes.periods.upserts.into_values() {
            if self.periods.contains_key(&period.id) {
                period.version += 1;
            }
            self.periods.insert(period.id, period);
        }

        for id in &changes.journal_entries.deletes {
            self.journal_entries.remove(id);
        }
        self.journal_entries.extend(changes.journal_entries.upserts);

        for id in &changes.transactions.deletes {
            self.transactions.remove(id);
        }
        self.transactions.extend(changes.transactions.upserts);
    }
}

/// A [`LedgerStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn account_set(&self, id: AccountSetId) -> Result<Option<AccountSet>, StoreError> {
        Ok(self.tables.read().await.account_sets.get(&id).cloned())
    }

    async fn account_set_by_name(&self, name: &str) -> Result<Option<AccountSet>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .account_sets
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn accounts(&self, account_set_id: AccountSetId) -> Result<Vec<Account>, StoreError> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|a| a.account_set_id == account_set_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn transactions_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| t.journal_entry_id == entry_id)
            .cloned()
            .collect())
    }

    async fn journal_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self.tables.read().await.journal_entries.get(&id).cloned())
    }

    async fn journal_entries_between(
        &self,
        account_set_id: AccountSetId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .journal_entries
            .values()
            .filter(|e| {
                e.account_set_id == account_set_id
                    && e.modified_date >= from
                    && e.modified_date <= to
            })
            .cloned()
            .collect())
    }

    async fn period(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, StoreError> {
        Ok(self.tables.read().await.periods.get(&id).cloned())
    }

    async fn periods(
        &self,
        account_set_id: AccountSetId,
    ) -> Result<Vec<AccountingPeriod>, StoreError> {
        let tables = self.tables.read().await;
        let mut periods: Vec<AccountingPeriod> = tables
            .periods
            .values()
            .filter(|p| p.account_set_id == account_set_id)
            .cloned()
            .collect();
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(&changes)?;
        tables.apply(changes);
        Ok(())
    }
}
