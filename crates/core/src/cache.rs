//! Read cache for accounts and periods using Moka.
//!
//! Entries are shared `Arc`s so hits never clone whole period holder maps.
//! The ledger facade invalidates every touched key after each commit.
//!
//! Fills race with invalidation: a reader that loaded a value before a
//! commit may try to cache it after the commit's invalidation ran. Each
//! invalidation bumps a generation counter, and a fill only sticks if the
//! generation it started under is still current.

use moka::sync::Cache;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tally_shared::types::{AccountId, AccountSetId, AccountingPeriodId};

use crate::account::Account;
use crate::period::AccountingPeriod;
use crate::store::Touched;

/// Default cache capacity (entries per table).
pub const DEFAULT_CACHE_CAPACITY: u64 = 2000;

/// Default time-to-live for cache entries (2 hours).
pub const DEFAULT_TTL_SECS: u64 = 7200;

/// Cache of accounts, per-set account lists and periods.
#[derive(Clone)]
pub struct LedgerCache {
    accounts: Cache<AccountId, Arc<Account>>,
    account_lists: Cache<AccountSetId, Arc<Vec<Account>>>,
    periods: Cache<AccountingPeriodId, Arc<AccountingPeriod>>,
    generation: Arc<AtomicU64>,
}

impl LedgerCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries per table
    /// * `ttl_secs` - Time-to-live in seconds for each entry
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        Self {
            accounts: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            account_lists: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            periods: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current invalidation generation.
    ///
    /// Take it before reading the store and hand it to the `put_*` call
    /// that caches the result.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Inserts unless an invalidation ran since `generation` was taken.
    ///
    /// The second check covers an invalidation that lands between the
    /// first check and the insert.
    fn fill<K, V>(&self, cache: &Cache<K, V>, generation: u64, key: K, value: V)
    where
        K: Hash + Eq + Copy + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if self.generation() != generation {
            return;
        }
        cache.insert(key, value);
        if self.generation() != generation {
            cache.invalidate(&key);
        }
    }

    /// Cached account, if present.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<Arc<Account>> {
        self.accounts.get(&id)
    }

    /// Caches an account loaded under `generation`.
    pub fn put_account(&self, generation: u64, account: Arc<Account>) {
        self.fill(&self.accounts, generation, account.id, account);
    }

    /// Cached account list of an account set, if present.
    #[must_use]
    pub fn accounts(&self, account_set_id: AccountSetId) -> Option<Arc<Vec<Account>>> {
        self.account_lists.get(&account_set_id)
    }

    /// Caches the account list of an account set loaded under `generation`.
    pub fn put_accounts(
        &self,
        generation: u64,
        account_set_id: AccountSetId,
        accounts: Arc<Vec<Account>>,
    ) {
        self.fill(&self.account_lists, generation, account_set_id, accounts);
    }

    /// Cached period, if present.
    #[must_use]
    pub fn period(&self, id: AccountingPeriodId) -> Option<Arc<AccountingPeriod>> {
        self.periods.get(&id)
    }

    /// Caches a period loaded under `generation`.
    pub fn put_period(&self, generation: u64, period: Arc<AccountingPeriod>) {
        self.fill(&self.periods, generation, period.id, period);
    }

    /// Drops every key a commit wrote.
    pub fn invalidate(&self, touched: &Touched) {
        // Bump first so fills racing with the removals below back out.
        self.generation.fetch_add(1, Ordering::SeqCst);
        for id in &touched.account_sets {
            self.account_lists.invalidate(id);
        }
        for id in &touched.accounts {
            self.accounts.invalidate(id);
        }
        for id in &touched.periods {
            self.periods.invalidate(id);
        }
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.accounts.invalidate_all();
        self.account_lists.invalidate_all();
        self.periods.invalidate_all();
    }

    /// Returns the number of entries currently cached across all tables.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.accounts.entry_count() + self.account_lists.entry_count() + self.periods.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.accounts.run_pending_tasks();
        self.account_lists.run_pending_tasks();
        self.periods.run_pending_tasks();
    }
}

impl Default for LedgerCache {
    fn default() -> Self {
        Self::new()
    }
}
