//! Chart of accounts.
//!
//! This module implements the account directory:
//! - Account code and level rules
//! - Account, account set and import types
//! - Tree maintenance (create, update, delete, import, ancestry)
//! - The standard chart used to seed new account sets

pub mod chart;
pub mod code;
pub mod directory;
pub mod types;

#[cfg(test)]
mod code_props;
#[cfg(test)]
mod directory_tests;

pub use chart::standard_chart;
pub use code::{CODE_LENGTHS, MAX_LEVEL, parent_code, resolve_level_and_validate};
pub use directory::AccountDirectory;
pub use types::{
    Account, AccountClass, AccountDraft, AccountPatch, AccountSet, AccountState, AccountType,
    Direction, ImportReport, NewAccount,
};
