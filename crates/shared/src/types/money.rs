//! Money helpers with fixed two-decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount stored by the ledger is a `rust_decimal::Decimal` rounded
//! half-up (away from zero) to two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount half-up to [`MONEY_SCALE`] decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if the amount carries no more than [`MONEY_SCALE`] significant decimals.
#[must_use]
pub fn is_money_scale(amount: Decimal) -> bool {
    round_money(amount) == amount
}
