//! Ledger error types.
//!
//! Every failure surfaced by the ledger belongs to one [`ErrorKind`]:
//! validation, not-found, conflict, integrity, concurrency or store.
//! Business-rule violations are never retried; only
//! [`LedgerError::ConcurrentModification`] is.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use thiserror::Error;

use crate::account::AccountType;
use crate::store::StoreError;

/// Broad classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input; no side effects.
    Validation,
    /// Referenced entity does not exist.
    NotFound,
    /// Operation conflicts with the current structure or state.
    Conflict,
    /// A ledger invariant does not hold.
    Integrity,
    /// Lost an optimistic concurrency race; safe to retry.
    Concurrency,
    /// Backend failure.
    Store,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entity belongs to a different account set than the caller's.
    #[error("Account set mismatch: expected {expected}, found {found}")]
    TenantMismatch {
        /// The caller's account set.
        expected: AccountSetId,
        /// The account set carried by the entity.
        found: AccountSetId,
    },

    /// Entry is dated after the current date.
    #[error("Entry date {date} is after today ({today})")]
    FutureDated {
        /// The supplied entry date.
        date: NaiveDate,
        /// The caller's current date.
        today: NaiveDate,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Entry has no lines.
    #[error("Entry must have at least one line")]
    NoLines,

    /// Line amount cannot be negative.
    #[error("Line amount for account {0} cannot be negative")]
    NegativeAmount(AccountId),

    /// Account code contains characters other than ASCII digits.
    #[error("Account code must contain only digits: {0:?}")]
    InvalidCode(String),

    /// Account code length does not map to any level.
    #[error("Account code {code:?} has unsupported length {length}")]
    InvalidCodeLength {
        /// The offending code.
        code: String,
        /// Its length.
        length: usize,
    },

    /// Requested level is outside 1..=4.
    #[error("Account level {0} is out of range")]
    InvalidLevel(u8),

    /// Requested level does not match the code length.
    #[error("Account code {code:?} does not match level {level}")]
    LevelMismatch {
        /// The offending code.
        code: String,
        /// The requested level.
        level: u8,
    },

    /// Account code already in use within the account set.
    #[error("Account code {0} already exists")]
    DuplicateAccountCode(String),

    /// Account name already in use for this type within the account set.
    #[error("Account {name:?} of type {account_type} already exists")]
    DuplicateAccountName {
        /// The duplicated name.
        name: String,
        /// The account type.
        account_type: AccountType,
    },

    /// Account code does not start with its parent's code.
    #[error("Account code {code} does not extend parent code {parent_code}")]
    ParentCodeMismatch {
        /// The child code.
        code: String,
        /// The parent code.
        parent_code: String,
    },

    /// Account name is blank.
    #[error("Account name cannot be empty")]
    EmptyName,

    /// Account set name already in use.
    #[error("Account set {0:?} already exists")]
    DuplicateAccountSetName(String),

    /// Only leaf accounts can carry transactions.
    #[error("Account {0} has sub-accounts and cannot carry transactions")]
    NonLeafAccount(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Voucher number already used in the same period.
    #[error("Voucher number {0} is already used in this period")]
    DuplicateVoucher(i32),

    /// Voucher numbers start at 1.
    #[error("Voucher number {0} is invalid")]
    InvalidVoucherNumber(i32),

    /// The same transaction line appears twice in one entry.
    #[error("Transaction {0} appears more than once")]
    DuplicateLine(TransactionId),

    /// The transaction line belongs to another journal entry.
    #[error("Transaction {0} belongs to another journal entry")]
    ForeignLine(TransactionId),

    /// Cannot close a period that has not started yet.
    #[error("Period starting {start} has not started (today is {today})")]
    PeriodNotStarted {
        /// Period start date.
        start: NaiveDate,
        /// The caller's current date.
        today: NaiveDate,
    },

    // ========== Not Found Errors ==========
    /// Account set not found.
    #[error("Account set not found: {0}")]
    AccountSetNotFound(AccountSetId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account carries the parent code required by a new account.
    #[error("Parent account with code {0} not found")]
    ParentNotFound(String),

    /// Accounting period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(AccountingPeriodId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Conflict Errors ==========
    /// Account has sub-accounts.
    #[error("Account {0} has sub-accounts")]
    AccountHasChildren(AccountId),

    /// Account has transactions.
    #[error("Account {0} has transactions")]
    AccountHasTransactions(AccountId),

    /// Code change requested on an account with sub-accounts.
    #[error("Cannot change the code of account {0} because it has sub-accounts")]
    CodeChangeWithChildren(AccountId),

    /// Period is already closed.
    #[error("Accounting period {0} is already closed")]
    PeriodAlreadyClosed(AccountingPeriodId),

    /// Period is not closed.
    #[error("Accounting period {0} is not closed")]
    PeriodNotClosed(AccountingPeriodId),

    // ========== Integrity Errors ==========
    /// Parent chain is dangling or cyclic.
    #[error("Account hierarchy is broken at account {0}")]
    BrokenHierarchy(AccountId),

    /// Transfer target account does not exist.
    #[error("Current year profit account {0} not found")]
    MissingProfitAccount(String),

    /// Transfer target account has sub-accounts.
    #[error("Current year profit account {0} has sub-accounts")]
    ProfitAccountNotLeaf(String),

    /// A transferable account still carries a balance after closing transfers.
    #[error("Account {code} still has balance {balance} after transfer")]
    TransferIncomplete {
        /// Account code.
        code: String,
        /// Remaining balance.
        balance: Decimal,
    },

    /// Assets plus cost do not equal liabilities plus equity.
    #[error("Accounting equation does not balance, difference {0}")]
    EquationImbalance(Decimal),

    /// Voucher numbers in a period are not a contiguous run from 1.
    #[error("Voucher numbers are not contiguous: expected {expected}, found {found}")]
    VoucherGap {
        /// The next expected number.
        expected: i32,
        /// The number found instead.
        found: i32,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Store Errors ==========
    /// Persistent store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::ConcurrentModification,
            other => Self::Store(other),
        }
    }
}

impl LedgerError {
    /// Returns the broad classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TenantMismatch { .. }
            | Self::FutureDated { .. }
            | Self::UnbalancedEntry { .. }
            | Self::NoLines
            | Self::NegativeAmount(_)
            | Self::InvalidCode(_)
            | Self::InvalidCodeLength { .. }
            | Self::InvalidLevel(_)
            | Self::LevelMismatch { .. }
            | Self::DuplicateAccountCode(_)
            | Self::DuplicateAccountName { .. }
            | Self::ParentCodeMismatch { .. }
            | Self::EmptyName
            | Self::DuplicateAccountSetName(_)
            | Self::NonLeafAccount(_)
            | Self::AccountInactive(_)
            | Self::DuplicateVoucher(_)
            | Self::InvalidVoucherNumber(_)
            | Self::DuplicateLine(_)
            | Self::ForeignLine(_)
            | Self::PeriodNotStarted { .. } => ErrorKind::Validation,

            Self::AccountSetNotFound(_)
            | Self::AccountNotFound(_)
            | Self::ParentNotFound(_)
            | Self::PeriodNotFound(_)
            | Self::EntryNotFound(_)
            | Self::TransactionNotFound(_) => ErrorKind::NotFound,

            Self::AccountHasChildren(_)
            | Self::AccountHasTransactions(_)
            | Self::CodeChangeWithChildren(_)
            | Self::PeriodAlreadyClosed(_)
            | Self::PeriodNotClosed(_) => ErrorKind::Conflict,

            Self::BrokenHierarchy(_)
            | Self::MissingProfitAccount(_)
            | Self::ProfitAccountNotLeaf(_)
            | Self::TransferIncomplete { .. }
            | Self::EquationImbalance(_)
            | Self::VoucherGap { .. } => ErrorKind::Integrity,

            Self::ConcurrentModification => ErrorKind::Concurrency,

            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TenantMismatch { .. } => "TENANT_MISMATCH",
            Self::FutureDated { .. } => "FUTURE_DATED",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NoLines => "NO_LINES",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::InvalidCodeLength { .. } => "INVALID_CODE_LENGTH",
            Self::InvalidLevel(_) => "INVALID_LEVEL",
            Self::LevelMismatch { .. } => "LEVEL_MISMATCH",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::DuplicateAccountName { .. } => "DUPLICATE_ACCOUNT_NAME",
            Self::ParentCodeMismatch { .. } => "PARENT_CODE_MISMATCH",
            Self::EmptyName => "EMPTY_NAME",
            Self::DuplicateAccountSetName(_) => "DUPLICATE_ACCOUNT_SET_NAME",
            Self::NonLeafAccount(_) => "NON_LEAF_ACCOUNT",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::DuplicateVoucher(_) => "DUPLICATE_VOUCHER",
            Self::InvalidVoucherNumber(_) => "INVALID_VOUCHER_NUMBER",
            Self::DuplicateLine(_) => "DUPLICATE_LINE",
            Self::ForeignLine(_) => "FOREIGN_LINE",
            Self::PeriodNotStarted { .. } => "PERIOD_NOT_STARTED",
            Self::AccountSetNotFound(_) => "ACCOUNT_SET_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AccountHasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::AccountHasTransactions(_) => "ACCOUNT_HAS_TRANSACTIONS",
            Self::CodeChangeWithChildren(_) => "CODE_CHANGE_WITH_CHILDREN",
            Self::PeriodAlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::PeriodNotClosed(_) => "PERIOD_NOT_CLOSED",
            Self::BrokenHierarchy(_) => "BROKEN_HIERARCHY",
            Self::MissingProfitAccount(_) => "MISSING_PROFIT_ACCOUNT",
            Self::ProfitAccountNotLeaf(_) => "PROFIT_ACCOUNT_NOT_LEAF",
            Self::TransferIncomplete { .. } => "TRANSFER_INCOMPLETE",
            Self::EquationImbalance(_) => "EQUATION_IMBALANCE",
            Self::VoucherGap { .. } => "VOUCHER_GAP",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            // 400 Bad Request - validation errors
            ErrorKind::Validation => 400,
            // 404 Not Found
            ErrorKind::NotFound => 404,
            // 409 Conflict - structural and concurrency conflicts
            ErrorKind::Conflict | ErrorKind::Concurrency => 409,
            // 422 Unprocessable - ledger invariants do not hold
            ErrorKind::Integrity => 422,
            // 500 Internal Server Error
            ErrorKind::Store => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
