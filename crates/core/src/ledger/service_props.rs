//! Property-based tests for the ledger facade.
//!
//! - Any sequence of balanced entries keeps debits equal to credits
//! - Closing always zeroes the transferable accounts and balances the equation

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::Ledger;
use crate::account::{Direction, standard_chart};
use crate::closing::{TransferCategory, equation_difference};
use crate::context::RequestContext;
use crate::journal::{EntryLine, JournalEntryView};
use crate::test_support::date;

/// Leaf codes entries may post to.
const CODES: [&str; 10] = [
    "1001", "1002", "2202", "3001", "4001", "5001", "5301", "5401", "5602", "5901",
];

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Debit account index, credit account index, amount, day of June.
fn posting() -> impl Strategy<Value = (usize, usize, Decimal, u32)> {
    (0..CODES.len(), 0..CODES.len(), positive_amount(), 1u32..=30)
}

struct Run {
    /// Sum of debit-signed balances over every level-1 account before closing.
    net_before_close: Decimal,
    /// Equation difference after closing.
    difference_after_close: Decimal,
    /// Largest absolute transferable balance left after closing.
    leftover: Decimal,
}

fn run(postings: &[(usize, usize, Decimal, u32)]) -> Run {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let ledger = Ledger::in_memory();
        let (set, june) = ledger
            .open_account_set("Props", date(2024, 6, 1), None, date(2024, 7, 1))
            .await
            .unwrap();
        let ctx = RequestContext::new(set.id, date(2024, 7, 1));
        ledger.import_accounts(ctx, standard_chart()).await.unwrap();
        let accounts = ledger.accounts(ctx).await.unwrap();
        let id = |code: &str| accounts.iter().find(|a| a.code == code).unwrap().id;

        for &(debit, credit, amount, day) in postings {
            let view = JournalEntryView::new(set.id, "Rec")
                .dated(date(2024, 6, day))
                .line(EntryLine::debit(id(CODES[debit]), amount, ""))
                .line(EntryLine::credit(id(CODES[credit]), amount, ""));
            ledger.process(ctx, view).await.unwrap();
        }

        let period = ledger.period(ctx, june.id).await.unwrap();
        let net_before_close = accounts
            .iter()
            .filter(|a| a.level == 1)
            .map(|a| {
                let balance = period.holder(a.id).balance;
                match a.direction {
                    Direction::Debit => balance,
                    Direction::Credit => -balance,
                }
            })
            .sum();

        let outcome = ledger.close_period(ctx, june.id).await.unwrap();
        let leftover = accounts
            .iter()
            .filter(|a| TransferCategory::of(a.account_type).is_some())
            .map(|a| outcome.closed.holder(a.id).balance.abs())
            .max()
            .unwrap_or_default();

        Run {
            net_before_close,
            difference_after_close: equation_difference(&accounts, &outcome.closed),
            leftover,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    #[test]
    fn prop_close_always_balances(postings in proptest::collection::vec(posting(), 0..10)) {
        let result = run(&postings);
        prop_assert_eq!(result.net_before_close, Decimal::ZERO);
        prop_assert_eq!(result.difference_after_close, Decimal::ZERO);
        prop_assert_eq!(result.leftover, Decimal::ZERO);
    }
}
