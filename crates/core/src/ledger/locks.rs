//! Per-account-set write serialization.

use std::sync::Arc;

use dashmap::DashMap;
use tally_shared::types::AccountSetId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per account set, created on first use.
///
/// An entry is dropped again when its last holder releases it, so the
/// table only grows with the number of account sets in flight.
#[derive(Debug, Default)]
pub struct TenantLocks {
    locks: DashMap<AccountSetId, Arc<Mutex<()>>>,
}

impl TenantLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of an account set.
    pub async fn acquire(&self, account_set_id: AccountSetId) -> TenantGuard<'_> {
        // The map shard guard must be released before awaiting.
        let lock = Arc::clone(self.locks.entry(account_set_id).or_default().value());
        TenantGuard {
            guard: Some(lock.lock_owned().await),
            locks: self,
            account_set_id,
        }
    }

    /// Number of account sets currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no account set is locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds an account set's lock; releasing it prunes the unused table entry.
#[derive(Debug)]
pub struct TenantGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a TenantLocks,
    account_set_id: AccountSetId,
}

impl Drop for TenantGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones of the Arc are only made under the shard lock held here,
        // so a count of one means nobody holds or waits for this mutex.
        self.locks
            .locks
            .remove_if(&self.account_set_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
