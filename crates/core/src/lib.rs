//! Core double-entry bookkeeping logic for Tally.
//!
//! This crate contains the ledger's business rules with no database
//! dependencies; persistence is reached only through [`store::LedgerStore`].
//!
//! # Modules
//!
//! - `account` - Chart of accounts and the account directory
//! - `period` - Monthly accounting periods and cumulative amount holders
//! - `journal` - Journal entry validation and processing
//! - `closing` - Profit and loss transfer and period closing
//! - `store` - Store boundary, unit of work and the in-memory store
//! - `cache` - Moka read cache for accounts and periods
//! - `ledger` - The facade callers use

pub mod account;
pub mod cache;
pub mod closing;
pub mod context;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod period;
pub mod store;

#[cfg(test)]
mod test_support;

pub use context::RequestContext;
pub use error::{ErrorKind, LedgerError};
pub use ledger::Ledger;
