//! Period closing.
//!
//! Closing a period moves every profit-and-loss balance into the current
//! year profit account, checks the books, then locks the period.

pub mod category;
pub mod engine;
pub mod verify;


pub use category::{CURRENT_YEAR_PROFIT_CODE, TRANSFER_VOUCHER_WORD, TransferCategory};
pub use engine::{ClosingEngine, ClosingOutcome};
pub use verify::{equation_difference, verify_equation, verify_transfers, verify_vouchers};
