//! The ledger facade.
//!
//! This module is the entry point callers use:
//! - Per-account-set write serialization
//! - One unit of work per mutating call, committed atomically
//! - Retry on optimistic concurrency conflicts
//! - Cached reads of accounts and periods

pub mod locks;
pub mod service;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod service_tests;

pub use locks::{TenantGuard, TenantLocks};
pub use service::Ledger;
