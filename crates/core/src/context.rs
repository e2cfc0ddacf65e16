//! Per-request context threaded through every ledger call.

use chrono::{NaiveDate, Utc};
use tally_shared::types::AccountSetId;

use crate::error::LedgerError;

/// The account set an operation acts on, and the date it considers "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// The caller's account set (tenant).
    pub account_set_id: AccountSetId,
    /// The current date used for future-date checks and default entry dates.
    pub today: NaiveDate,
}

impl RequestContext {
    /// Creates a context with an explicit current date.
    #[must_use]
    pub const fn new(account_set_id: AccountSetId, today: NaiveDate) -> Self {
        Self {
            account_set_id,
            today,
        }
    }

    /// Creates a context dated with the current UTC day.
    #[must_use]
    pub fn now(account_set_id: AccountSetId) -> Self {
        Self::new(account_set_id, Utc::now().date_naive())
    }

    /// Fails unless `found` is the caller's account set.
    pub fn ensure_tenant(&self, found: AccountSetId) -> Result<(), LedgerError> {
        if found == self.account_set_id {
            Ok(())
        } else {
            Err(LedgerError::TenantMismatch {
                expected: self.account_set_id,
                found,
            })
        }
    }
}
