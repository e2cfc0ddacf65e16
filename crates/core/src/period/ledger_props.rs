//! Property-based tests for the period ledger.
//!
//! - A delta lands in its own period and every later one, never earlier
//! - Ancestors always carry the same totals as their single child

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::PeriodSeeding;

use super::PeriodLedger;
use crate::account::{AccountDirectory, AccountType, Direction, NewAccount};
use crate::period::AmountHolder;
use crate::test_support::{Books, date};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A debit or credit of some amount in month 1, 2 or 3 of 2024.
fn delta() -> impl Strategy<Value = (u32, bool, Decimal)> {
    (1u32..=3, any::<bool>(), positive_amount())
}

/// Applies the deltas to a level-2 account and returns, per month, the
/// holders of the account and of its parent.
fn run(deltas: &[(u32, bool, Decimal)]) -> Vec<(AmountHolder, AmountHolder)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let books = Books::open(date(2024, 1, 1), date(2024, 3, 31)).await;
        let parent = books.id("1002").await;
        let mut uow = books.uow();
        PeriodLedger::ensure_periods_through(
            &mut uow,
            books.account_set.id,
            date(2024, 3, 1),
            PeriodSeeding::CarryForward,
        )
        .await
        .unwrap();
        let child = AccountDirectory::create_account(
            &mut uow,
            books.ctx,
            NewAccount::new("10020001", "Branch Account", AccountType::CurrentAsset),
        )
        .await
        .unwrap();

        for &(month, is_debit, amount) in deltas {
            let (debit, credit) = if is_debit {
                (amount, Decimal::ZERO)
            } else {
                (Decimal::ZERO, amount)
            };
            PeriodLedger::apply_delta(
                &mut uow,
                child.id,
                Direction::Debit,
                debit,
                credit,
                date(2024, month, 15),
            )
            .await
            .unwrap();
        }

        uow.periods(books.account_set.id)
            .await
            .unwrap()
            .iter()
            .map(|p| (p.holder(child.id), p.holder(parent)))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_delta_is_cumulative_from_its_month(deltas in proptest::collection::vec(delta(), 1..12)) {
        let holders = run(&deltas);
        prop_assert_eq!(holders.len(), 3);

        for (index, (child, _)) in holders.iter().enumerate() {
            let month = u32::try_from(index).unwrap() + 1;
            let expected: Decimal = deltas
                .iter()
                .filter(|(m, _, _)| *m <= month)
                .map(|(_, is_debit, amount)| if *is_debit { *amount } else { -*amount })
                .sum();
            prop_assert_eq!(child.balance, expected);
            prop_assert_eq!(child.balance, child.total_debit - child.total_credit);
        }
    }

    #[test]
    fn prop_parent_mirrors_only_child(deltas in proptest::collection::vec(delta(), 1..12)) {
        for (child, parent) in run(&deltas) {
            prop_assert_eq!(child, parent);
        }
    }
}
