//! Property-based tests for entry validation.
//!
//! - Balanced entries pass and keep their balance after rounding
//! - Any non-zero imbalance is rejected

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::types::EntryLine;
use super::validation::{EntryTotals, validate_lines};
use crate::error::LedgerError;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a list of amounts.
fn amounts() -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec(positive_amount(), 1..8)
}

/// Debit lines for `debits` plus one credit line for their total.
fn balanced_lines(debits: &[Decimal]) -> Vec<EntryLine> {
    let total: Decimal = debits.iter().copied().sum();
    let mut lines: Vec<EntryLine> = debits
        .iter()
        .map(|&d| EntryLine::debit(AccountId::new(), d, ""))
        .collect();
    lines.push(EntryLine::credit(AccountId::new(), total, ""));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balanced_entries_pass(debits in amounts()) {
        let lines = validate_lines(&balanced_lines(&debits)).unwrap();
        let totals = EntryTotals::of(&lines);
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.debit, debits.iter().copied().sum::<Decimal>());
    }

    #[test]
    fn prop_imbalance_rejected(debits in amounts(), skew in positive_amount()) {
        let mut lines = balanced_lines(&debits);
        lines[0].debit += skew;
        let result = validate_lines(&lines);
        let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedEntry { .. }));
        prop_assert!(is_unbalanced);
    }

    #[test]
    fn prop_validated_amounts_have_two_decimals(debits in amounts()) {
        for line in validate_lines(&balanced_lines(&debits)).unwrap() {
            prop_assert!(line.debit.scale() <= 2);
            prop_assert!(line.credit.scale() <= 2);
        }
    }
}
