//! Staging overlay for one mutating ledger call.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};

use super::{ChangeSet, LedgerStore, StoreError};
use crate::account::{Account, AccountSet};
use crate::journal::{JournalEntry, Transaction};
use crate::period::AccountingPeriod;

/// Reads see the store with this unit's own pending writes applied on top.
///
/// Nothing reaches the store until the owner commits [`UnitOfWork::into_changes`];
/// dropping the unit discards every staged write.
pub struct UnitOfWork {
    store: Arc<dyn LedgerStore>,
    changes: ChangeSet,
}

impl UnitOfWork {
    /// Starts an empty unit of work over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            changes: ChangeSet::default(),
        }
    }

    /// Returns the staged writes.
    #[must_use]
    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }

    /// Returns the staged writes without consuming the unit.
    #[must_use]
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    // ========== Account sets ==========

    /// Finds an account set by id.
    pub async fn account_set(&self, id: AccountSetId) -> Result<Option<AccountSet>, StoreError> {
        match self.changes.account_sets.lookup(&id) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.account_set(id).await,
        }
    }

    /// Finds an account set by name.
    pub async fn account_set_by_name(&self, name: &str) -> Result<Option<AccountSet>, StoreError> {
        if let Some(staged) = self
            .changes
            .account_sets
            .upserts
            .values()
            .find(|s| s.name == name)
        {
            return Ok(Some(staged.clone()));
        }
        self.store.account_set_by_name(name).await
    }

    /// Stages an account set insert.
    pub fn put_account_set(&mut self, account_set: AccountSet) {
        self.changes.account_sets.put(account_set.id, account_set);
    }

    // ========== Accounts ==========

    /// Finds an account by id.
    pub async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        match self.changes.accounts.lookup(&id) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.account(id).await,
        }
    }

    /// Lists every account of an account set, ordered by code.
    pub async fn accounts(&self, account_set_id: AccountSetId) -> Result<Vec<Account>, StoreError> {
        let base = self.store.accounts(account_set_id).await?;
        let mut accounts = self.changes.accounts.overlay(
            base,
            |a| a.id,
            |a| a.account_set_id == account_set_id,
        );
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    /// Stages an account upsert.
    pub fn put_account(&mut self, account: Account) {
        self.changes.accounts.put(account.id, account);
    }

    /// Stages an account delete.
    pub fn delete_account(&mut self, id: AccountId) {
        self.changes.accounts.delete(id);
    }

    // ========== Transactions ==========

    /// Finds a transaction by id.
    pub async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        match self.changes.transactions.lookup(&id) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.transaction(id).await,
        }
    }

    /// Lists the transactions posted to an account.
    pub async fn transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let base = self.store.transactions_for_account(account_id).await?;
        Ok(self
            .changes
            .transactions
            .overlay(base, |t| t.id, |t| t.account_id == account_id))
    }

    /// Lists the transactions of a journal entry.
    pub async fn transactions_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let base = self.store.transactions_for_entry(entry_id).await?;
        Ok(self
            .changes
            .transactions
            .overlay(base, |t| t.id, |t| t.journal_entry_id == entry_id))
    }

    /// Stages a transaction upsert.
    pub fn put_transaction(&mut self, transaction: Transaction) {
        self.changes.transactions.put(transaction.id, transaction);
    }

    /// Stages a transaction delete.
    pub fn delete_transaction(&mut self, id: TransactionId) {
        self.changes.transactions.delete(id);
    }

    // ========== Journal entries ==========

    /// Finds a journal entry by id.
    pub async fn journal_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        match self.changes.journal_entries.lookup(&id) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.journal_entry(id).await,
        }
    }

    /// Lists the entries of an account set dated within `[from, to]`.
    pub async fn journal_entries_between(
        &self,
        account_set_id: AccountSetId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let base = self
            .store
            .journal_entries_between(account_set_id, from, to)
            .await?;
        Ok(self.changes.journal_entries.overlay(
            base,
            |e| e.id,
            |e| e.account_set_id == account_set_id && e.modified_date >= from && e.modified_date <= to,
        ))
    }

    /// Stages a journal entry upsert.
    pub fn put_journal_entry(&mut self, entry: JournalEntry) {
        self.changes.journal_entries.put(entry.id, entry);
    }

    /// Stages a journal entry delete.
    pub fn delete_journal_entry(&mut self, id: JournalEntryId) {
        self.changes.journal_entries.delete(id);
    }

    // ========== Accounting periods ==========

    /// Finds an accounting period by id.
    pub async fn period(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, StoreError> {
        match self.changes.periods.lookup(&id) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.period(id).await,
        }
    }

    /// Lists the periods of an account set ordered by start date.
    pub async fn periods(
        &self,
        account_set_id: AccountSetId,
    ) -> Result<Vec<AccountingPeriod>, StoreError> {
        let base = self.store.periods(account_set_id).await?;
        let mut periods = self.changes.periods.overlay(
            base,
            |p| p.id,
            |p| p.account_set_id == account_set_id,
        );
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    /// Stages a period upsert.
    pub fn put_period(&mut self, period: AccountingPeriod) {
        self.changes.periods.put(period.id, period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::BTreeMap;

    fn sample_set(name: &str) -> AccountSet {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        AccountSet {
            id: AccountSetId::new(),
            name: name.to_string(),
            start_date: today,
            description: None,
            created_date: today,
        }
    }

    #[tokio::test]
    async fn test_reads_see_staged_writes() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let set = sample_set("Demo");
        let mut uow = UnitOfWork::new(Arc::clone(&store));

        uow.put_account_set(set.clone());
        let period = AccountingPeriod::for_month(set.id, set.start_date, BTreeMap::new());
        uow.put_period(period.clone());

        assert_eq!(uow.account_set(set.id).await.unwrap(), Some(set.clone()));
        assert_eq!(uow.account_set_by_name("Demo").await.unwrap(), Some(set.clone()));
        assert_eq!(uow.periods(set.id).await.unwrap(), vec![period]);

        // Nothing is visible in the store until commit.
        assert!(store.account_set(set.id).await.unwrap().is_none());
        store.commit(uow.into_changes()).await.unwrap();
        assert!(store.account_set(set.id).await.unwrap().is_some());
    }
}
