//! Ledger service: the caller-facing API over the core components.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::BoxFuture;
use tally_shared::types::{AccountId, AccountSetId, AccountingPeriodId, JournalEntryId};
use tally_shared::{CacheConfig, LedgerConfig};
use tracing::{instrument, warn};

use super::locks::TenantLocks;
use crate::account::{
    Account, AccountDirectory, AccountDraft, AccountPatch, AccountSet, ImportReport, NewAccount,
};
use crate::cache::LedgerCache;
use crate::closing::{ClosingEngine, ClosingOutcome};
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::journal::{AutoEntryTemplate, JournalEntry, JournalEntryView, JournalProcessor};
use crate::period::{AccountingPeriod, BalanceRow, PeriodLedger};
use crate::store::{LedgerStore, MemoryStore, UnitOfWork};

/// The ledger facade.
///
/// Every mutating call takes the account set's lock, runs in a fresh unit
/// of work and commits once. Losing an optimistic concurrency race reruns
/// the whole call, up to `max_retries` attempts in total.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    cache: LedgerCache,
    locks: TenantLocks,
    config: LedgerConfig,
}

impl Ledger {
    /// Creates a ledger over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: &LedgerConfig, cache: &CacheConfig) -> Self {
        Self {
            store,
            cache: LedgerCache::with_config(cache.max_capacity, cache.ttl_secs),
            locks: TenantLocks::new(),
            config: config.clone(),
        }
    }

    /// Creates a ledger over a fresh in-memory store with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            &LedgerConfig::default(),
            &CacheConfig::default(),
        )
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// The read cache.
    #[must_use]
    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    // ========== Account sets ==========

    /// Opens a new account set with its first accounting period.
    #[instrument(skip(self, description))]
    pub async fn open_account_set(
        &self,
        name: &str,
        start_date: NaiveDate,
        description: Option<String>,
        today: NaiveDate,
    ) -> Result<(AccountSet, AccountingPeriod), LedgerError> {
        let name = name.to_string();
        self.mutate(None, |uow| {
            let name = name.clone();
            let description = description.clone();
            async move {
                AccountDirectory::open_account_set(uow, &name, start_date, description, today)
                    .await
            }
            .boxed()
        })
        .await
    }

    /// Loads an account set.
    pub async fn account_set(&self, ctx: RequestContext) -> Result<AccountSet, LedgerError> {
        self.store
            .account_set(ctx.account_set_id)
            .await?
            .ok_or(LedgerError::AccountSetNotFound(ctx.account_set_id))
    }

    // ========== Accounts ==========

    /// Creates an account.
    #[instrument(skip(self, new), fields(account_set_id = %ctx.account_set_id, code = %new.code))]
    pub async fn create_account(
        &self,
        ctx: RequestContext,
        new: NewAccount,
    ) -> Result<Account, LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            AccountDirectory::create_account(uow, ctx, new.clone()).boxed()
        })
        .await
    }

    /// Updates an account.
    #[instrument(skip(self, patch), fields(account_set_id = %ctx.account_set_id))]
    pub async fn update_account(
        &self,
        ctx: RequestContext,
        account_id: AccountId,
        patch: AccountPatch,
    ) -> Result<Account, LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            AccountDirectory::update_account(uow, ctx, account_id, patch.clone()).boxed()
        })
        .await
    }

    /// Deletes an account.
    #[instrument(skip(self), fields(account_set_id = %ctx.account_set_id))]
    pub async fn delete_account(
        &self,
        ctx: RequestContext,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            AccountDirectory::delete_account(uow, ctx, account_id).boxed()
        })
        .await
    }

    /// Imports account drafts, reconciling codes that already exist.
    #[instrument(skip(self, drafts), fields(account_set_id = %ctx.account_set_id, count = drafts.len()))]
    pub async fn import_accounts(
        &self,
        ctx: RequestContext,
        drafts: Vec<AccountDraft>,
    ) -> Result<ImportReport, LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            AccountDirectory::import_accounts(uow, ctx, drafts.clone()).boxed()
        })
        .await
    }

    /// Loads an account, from cache when possible.
    pub async fn account(
        &self,
        ctx: RequestContext,
        account_id: AccountId,
    ) -> Result<Arc<Account>, LedgerError> {
        let account = match self.cache.account(account_id) {
            Some(account) => account,
            None => {
                let generation = self.cache.generation();
                let account = Arc::new(
                    self.store
                        .account(account_id)
                        .await?
                        .ok_or(LedgerError::AccountNotFound(account_id))?,
                );
                self.cache.put_account(generation, Arc::clone(&account));
                account
            }
        };
        ctx.ensure_tenant(account.account_set_id)?;
        Ok(account)
    }

    /// Every account of the caller's account set ordered by code, from cache when possible.
    pub async fn accounts(&self, ctx: RequestContext) -> Result<Arc<Vec<Account>>, LedgerError> {
        if let Some(accounts) = self.cache.accounts(ctx.account_set_id) {
            return Ok(accounts);
        }
        let generation = self.cache.generation();
        let mut accounts = self.store.accounts(ctx.account_set_id).await?;
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        let accounts = Arc::new(accounts);
        self.cache
            .put_accounts(generation, ctx.account_set_id, Arc::clone(&accounts));
        Ok(accounts)
    }

    /// Accounts whose name or code contains `query`, case-insensitively.
    pub async fn search_accounts(
        &self,
        ctx: RequestContext,
        query: &str,
    ) -> Result<Vec<Account>, LedgerError> {
        let accounts = self.accounts(ctx).await?;
        Ok(AccountDirectory::search(&accounts, query))
    }

    /// True if the account can carry transactions.
    pub async fn is_leaf(&self, ctx: RequestContext, account_id: AccountId) -> Result<bool, LedgerError> {
        let account = self.account(ctx, account_id).await?;
        let accounts = self.accounts(ctx).await?;
        Ok(AccountDirectory::is_leaf(&account, &accounts))
    }

    /// The account followed by each ancestor up to level 1.
    pub async fn ancestors_of(
        &self,
        ctx: RequestContext,
        account_id: AccountId,
    ) -> Result<Vec<Account>, LedgerError> {
        let uow = self.reader();
        AccountDirectory::load(&uow, ctx, account_id).await?;
        AccountDirectory::ancestors_of(&uow, account_id).await
    }

    // ========== Journal entries ==========

    /// Validates and persists a journal entry.
    #[instrument(skip(self, view), fields(account_set_id = %ctx.account_set_id, entry_id = ?view.entry.id))]
    pub async fn process(
        &self,
        ctx: RequestContext,
        view: JournalEntryView,
    ) -> Result<JournalEntryView, LedgerError> {
        let seeding = self.config.period_seeding;
        self.mutate(Some(ctx.account_set_id), |uow| {
            JournalProcessor::process(uow, ctx, view.clone(), seeding).boxed()
        })
        .await
    }

    /// Reverses and deletes a journal entry.
    #[instrument(skip(self), fields(account_set_id = %ctx.account_set_id))]
    pub async fn delete_entry(
        &self,
        ctx: RequestContext,
        entry_id: JournalEntryId,
    ) -> Result<(), LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            JournalProcessor::delete_entry(uow, ctx, entry_id).boxed()
        })
        .await
    }

    /// Loads the stored view of a journal entry.
    pub async fn entry(
        &self,
        ctx: RequestContext,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntryView, LedgerError> {
        JournalProcessor::entry_view(&self.reader(), ctx, entry_id).await
    }

    /// Builds an entry from a template and processes it.
    #[instrument(skip(self, template), fields(account_set_id = %ctx.account_set_id, template = %template.name))]
    pub async fn generate_from_template(
        &self,
        ctx: RequestContext,
        template: &AutoEntryTemplate,
        date: NaiveDate,
    ) -> Result<JournalEntryView, LedgerError> {
        let seeding = self.config.period_seeding;
        self.mutate(Some(ctx.account_set_id), |uow| {
            let template = template.clone();
            async move {
                JournalProcessor::generate_from_template(uow, ctx, &template, date, seeding).await
            }
            .boxed()
        })
        .await
    }

    /// Renumbers a period's vouchers 1..n.
    #[instrument(skip(self), fields(account_set_id = %ctx.account_set_id))]
    pub async fn reorder_voucher_numbers(
        &self,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            JournalProcessor::reorder_voucher_numbers(uow, ctx, period_id).boxed()
        })
        .await
    }

    // ========== Periods ==========

    /// Transfers profit and loss, verifies and closes a period.
    ///
    /// The returned periods are read back after the commit.
    #[instrument(skip(self), fields(account_set_id = %ctx.account_set_id))]
    pub async fn close_period(
        &self,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<ClosingOutcome, LedgerError> {
        let seeding = self.config.period_seeding;
        let mut outcome = self
            .mutate(Some(ctx.account_set_id), |uow| {
                ClosingEngine::close_period(uow, ctx, period_id, seeding).boxed()
            })
            .await?;

        if let Some(closed) = self.store.period(outcome.closed.id).await? {
            outcome.closed = closed;
        }
        if let Some(next) = self.store.period(outcome.next.id).await? {
            outcome.next = next;
        }
        Ok(outcome)
    }

    /// Reopens a closed period and every later closed period.
    #[instrument(skip(self), fields(account_set_id = %ctx.account_set_id))]
    pub async fn reopen_period(
        &self,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<AccountingPeriod>, LedgerError> {
        self.mutate(Some(ctx.account_set_id), |uow| {
            PeriodLedger::reopen_period(uow, ctx, period_id).boxed()
        })
        .await
    }

    /// Loads a period, from cache when possible.
    pub async fn period(
        &self,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Arc<AccountingPeriod>, LedgerError> {
        let period = match self.cache.period(period_id) {
            Some(period) => period,
            None => {
                let generation = self.cache.generation();
                let period = Arc::new(
                    self.store
                        .period(period_id)
                        .await?
                        .ok_or(LedgerError::PeriodNotFound(period_id))?,
                );
                self.cache.put_period(generation, Arc::clone(&period));
                period
            }
        };
        ctx.ensure_tenant(period.account_set_id)?;
        Ok(period)
    }

    /// Every period of the caller's account set, oldest first.
    pub async fn periods(&self, ctx: RequestContext) -> Result<Vec<AccountingPeriod>, LedgerError> {
        let mut periods = self.store.periods(ctx.account_set_id).await?;
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    /// Raw balance rows of a period, ordered by account code.
    pub async fn balance_rows(
        &self,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<BalanceRow>, LedgerError> {
        let period = self.period(ctx, period_id).await?;
        let accounts = self.accounts(ctx).await?;
        Ok(PeriodLedger::balance_rows(&accounts, &period))
    }

    // ========== Unit of work plumbing ==========

    fn reader(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }

    /// Runs `op` in a fresh unit of work and commits its changes.
    ///
    /// Holds the account set's lock throughout. A commit that loses a
    /// version race is retried with a new unit of work.
    async fn mutate<T, F>(&self, account_set_id: Option<AccountSetId>, op: F) -> Result<T, LedgerError>
    where
        F: for<'a> Fn(&'a mut UnitOfWork) -> BoxFuture<'a, Result<T, LedgerError>>,
    {
        let _guard = match account_set_id {
            Some(id) => Some(self.locks.acquire(id).await),
            None => None,
        };
        let max_attempts = self.config.max_retries.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut uow = self.reader();
            let value = op(&mut uow).await?;

            let changes = uow.into_changes();
            if changes.is_empty() {
                return Ok(value);
            }
            let touched = changes.touched(account_set_id);

            match self.store.commit(changes).await {
                Ok(()) => {
                    self.cache.invalidate(&touched);
                    return Ok(value);
                }
                Err(err) => {
                    self.cache.invalidate(&touched);
                    let err = LedgerError::from(err);
                    if !err.is_retryable() || attempt >= max_attempts {
                        return Err(err);
                    }
                    warn!(?account_set_id, attempt, error = %err, "Commit conflicted, retrying");
                }
            }
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .field("cached_entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
