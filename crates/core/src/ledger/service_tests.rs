//! End-to-end tests of the ledger facade over the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use tally_shared::{CacheConfig, LedgerConfig, PeriodSeeding};
use tokio::sync::Notify;

use super::Ledger;
use crate::account::{Account, AccountPatch, AccountSet, standard_chart};
use crate::closing::CURRENT_YEAR_PROFIT_CODE;
use crate::context::RequestContext;
use crate::error::{ErrorKind, LedgerError};
use crate::journal::{EntryLine, JournalEntry, JournalEntryView, Transaction};
use crate::period::AccountingPeriod;
use crate::store::{ChangeSet, LedgerStore, MemoryStore, StoreError};
use crate::test_support::date;

async fn open(ledger: &Ledger, start: NaiveDate, today: NaiveDate) -> RequestContext {
    let (set, _) = ledger
        .open_account_set("Demo", start, None, today)
        .await
        .unwrap();
    let ctx = RequestContext::new(set.id, today);
    ledger.import_accounts(ctx, standard_chart()).await.unwrap();
    ctx
}

async fn id(ledger: &Ledger, ctx: RequestContext, code: &str) -> AccountId {
    ledger
        .accounts(ctx)
        .await
        .unwrap()
        .iter()
        .find(|a| a.code == code)
        .unwrap()
        .id
}

async fn transfer(
    ledger: &Ledger,
    ctx: RequestContext,
    debit: &str,
    credit: &str,
    amount: Decimal,
    on: NaiveDate,
) -> Result<JournalEntryView, LedgerError> {
    let view = JournalEntryView::new(ctx.account_set_id, "Rec")
        .dated(on)
        .line(EntryLine::debit(id(ledger, ctx, debit).await, amount, ""))
        .line(EntryLine::credit(id(ledger, ctx, credit).await, amount, ""));
    ledger.process(ctx, view).await
}

async fn balance(ledger: &Ledger, ctx: RequestContext, code: &str, period: usize) -> Decimal {
    let account = id(ledger, ctx, code).await;
    ledger.periods(ctx).await.unwrap()[period].holder(account).balance
}

#[tokio::test]
async fn test_balanced_entry_moves_both_balances() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;

    let posted = transfer(&ledger, ctx, "1001", "5001", dec!(100.00), date(2024, 6, 3))
        .await
        .unwrap();

    assert_eq!(posted.lines.len(), 2);
    let stored = ledger.entry(ctx, posted.entry.id.unwrap()).await.unwrap();
    assert_eq!(stored, posted);
    assert_eq!(balance(&ledger, ctx, "1001", 0).await, dec!(100.00));
    assert_eq!(balance(&ledger, ctx, "5001", 0).await, dec!(100.00));
}

#[tokio::test]
async fn test_unbalanced_entry_changes_nothing() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    let view = JournalEntryView::new(ctx.account_set_id, "Rec")
        .line(EntryLine::debit(id(&ledger, ctx, "1001").await, dec!(100.00), ""))
        .line(EntryLine::credit(id(&ledger, ctx, "5001").await, dec!(90.00), ""));

    let err = ledger.process(ctx, view).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(balance(&ledger, ctx, "1001", 0).await, Decimal::ZERO);
    assert_eq!(balance(&ledger, ctx, "5001", 0).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_close_nets_income_and_expense_into_profit() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 7, 2)).await;
    transfer(&ledger, ctx, "1002", "5001", dec!(500.00), date(2024, 6, 10))
        .await
        .unwrap();
    transfer(&ledger, ctx, "5602", "1002", dec!(200.00), date(2024, 6, 20))
        .await
        .unwrap();
    let june = ledger.periods(ctx).await.unwrap()[0].id;
    let profit_before = balance(&ledger, ctx, CURRENT_YEAR_PROFIT_CODE, 0).await;

    let outcome = ledger.close_period(ctx, june).await.unwrap();

    assert_eq!(outcome.transfer_entries.len(), 2);
    assert!(
        outcome
            .transfer_entries
            .iter()
            .all(|e| e.entry.modified_date == Some(date(2024, 6, 30)))
    );
    let stored = ledger.periods(ctx).await.unwrap();
    assert_eq!(outcome.closed, stored[0]);
    assert_eq!(outcome.next, stored[1]);
    assert!(stored[0].closed);
    assert_eq!(balance(&ledger, ctx, "5001", 0).await, Decimal::ZERO);
    assert_eq!(balance(&ledger, ctx, "5602", 0).await, Decimal::ZERO);
    assert_eq!(
        balance(&ledger, ctx, CURRENT_YEAR_PROFIT_CODE, 0).await - profit_before,
        dec!(300.00)
    );

    let err = ledger.close_period(ctx, june).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_account_with_transactions_cannot_be_deleted() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    transfer(&ledger, ctx, "1001", "3001", dec!(5.00), date(2024, 6, 1))
        .await
        .unwrap();

    let err = ledger
        .delete_account(ctx, id(&ledger, ctx, "1001").await)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::AccountHasTransactions(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.http_status_code(), 409);
}

#[tokio::test]
async fn test_backdated_entry_adjusts_every_later_period() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 1, 1), date(2024, 3, 31)).await;
    for month in 1..=3 {
        transfer(&ledger, ctx, "1002", "3001", dec!(10.00), date(2024, month, 5))
            .await
            .unwrap();
    }
    let january = ledger.periods(ctx).await.unwrap()[0].id;
    ledger.close_period(ctx, january).await.unwrap();
    let before: Vec<Decimal> = {
        let bank = id(&ledger, ctx, "1002").await;
        ledger
            .periods(ctx)
            .await
            .unwrap()
            .iter()
            .map(|p| p.holder(bank).balance)
            .collect()
    };
    assert_eq!(before, vec![dec!(10.00), dec!(20.00), dec!(30.00)]);

    transfer(&ledger, ctx, "1002", "3001", dec!(7.50), date(2024, 1, 15))
        .await
        .unwrap();

    for (index, previous) in before.iter().enumerate() {
        assert_eq!(
            balance(&ledger, ctx, "1002", index).await,
            previous + dec!(7.50)
        );
    }
}

#[tokio::test]
async fn test_concurrent_postings_get_distinct_vouchers() {
    let ledger = Arc::new(Ledger::in_memory());
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            transfer(&ledger, ctx, "1001", "3001", dec!(1.00), date(2024, 6, 15)).await
        }));
    }
    let mut vouchers = Vec::new();
    for handle in handles {
        vouchers.push(handle.await.unwrap().unwrap().entry.voucher_num.unwrap());
    }
    vouchers.sort_unstable();

    assert_eq!(vouchers, (1..=16).collect::<Vec<_>>());
    assert_eq!(balance(&ledger, ctx, "1001", 0).await, dec!(16.00));
}

#[tokio::test]
async fn test_cached_account_refreshed_after_update() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    let cash = id(&ledger, ctx, "1001").await;
    assert_eq!(ledger.account(ctx, cash).await.unwrap().name, "Cash on Hand");

    ledger
        .update_account(
            ctx,
            cash,
            AccountPatch {
                name: Some("Till".to_string()),
                ..AccountPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(ledger.account(ctx, cash).await.unwrap().name, "Till");
    let found = ledger.search_accounts(ctx, "till").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(ledger.is_leaf(ctx, cash).await.unwrap());
}

#[tokio::test]
async fn test_reads_are_tenant_scoped() {
    let ledger = Ledger::in_memory();
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    let cash = id(&ledger, ctx, "1001").await;
    let june = ledger.periods(ctx).await.unwrap()[0].id;
    let stranger = RequestContext::new(AccountSetId::new(), ctx.today);

    assert!(matches!(
        ledger.account(stranger, cash).await,
        Err(LedgerError::TenantMismatch { .. })
    ));
    assert!(matches!(
        ledger.period(stranger, june).await,
        Err(LedgerError::TenantMismatch { .. })
    ));
    assert!(matches!(
        ledger.account_set(stranger).await,
        Err(LedgerError::AccountSetNotFound(_))
    ));
    let rows = ledger.balance_rows(ctx, june).await.unwrap();
    assert_eq!(rows.len(), standard_chart().len());
}

#[tokio::test]
async fn test_duplicate_account_set_name_rejected() {
    let ledger = Ledger::in_memory();
    open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;

    let err = ledger
        .open_account_set("Demo", date(2024, 6, 1), None, date(2024, 6, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccountSetName(_)));
}

/// Store that fails the next `failures` commits with a conflict.
///
/// With `hold_period_read` set, the next `period` read signals
/// `period_read` once loaded and waits for `resume` before returning.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
    commits: AtomicU32,
    hold_period_read: AtomicBool,
    period_read: Notify,
    resume: Notify,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
            commits: AtomicU32::new(0),
            hold_period_read: AtomicBool::new(false),
            period_read: Notify::new(),
            resume: Notify::new(),
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn account_set(&self, id: AccountSetId) -> Result<Option<AccountSet>, StoreError> {
        self.inner.account_set(id).await
    }

    async fn account_set_by_name(&self, name: &str) -> Result<Option<AccountSet>, StoreError> {
        self.inner.account_set_by_name(name).await
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.inner.account(id).await
    }

    async fn accounts(&self, account_set_id: AccountSetId) -> Result<Vec<Account>, StoreError> {
        self.inner.accounts(account_set_id).await
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        self.inner.transaction(id).await
    }

    async fn transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_for_account(account_id).await
    }

    async fn transactions_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_for_entry(entry_id).await
    }

    async fn journal_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.journal_entry(id).await
    }

    async fn journal_entries_between(
        &self,
        account_set_id: AccountSetId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.inner
            .journal_entries_between(account_set_id, from, to)
            .await
    }

    async fn period(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, StoreError> {
        let period = self.inner.period(id).await;
        if self.hold_period_read.swap(false, Ordering::SeqCst) {
            self.period_read.notify_one();
            self.resume.notified().await;
        }
        period
    }

    async fn periods(
        &self,
        account_set_id: AccountSetId,
    ) -> Result<Vec<AccountingPeriod>, StoreError> {
        self.inner.periods(account_set_id).await
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Conflict("injected".to_string()));
        }
        self.inner.commit(changes).await
    }
}

fn flaky_ledger(store: Arc<FlakyStore>, max_retries: u32) -> Ledger {
    let config = LedgerConfig {
        period_seeding: PeriodSeeding::CarryForward,
        max_retries,
    };
    Ledger::new(store, &config, &CacheConfig::default())
}

#[tokio::test]
async fn test_conflicting_commit_is_retried() {
    let store = Arc::new(FlakyStore::new(0));
    let ledger = flaky_ledger(Arc::clone(&store), 3);
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    let commits_before = store.commits.load(Ordering::SeqCst);

    store.failures.store(2, Ordering::SeqCst);
    transfer(&ledger, ctx, "1001", "3001", dec!(3.00), date(2024, 6, 2))
        .await
        .unwrap();

    assert_eq!(store.commits.load(Ordering::SeqCst) - commits_before, 3);
    assert_eq!(balance(&ledger, ctx, "1001", 0).await, dec!(3.00));
}

#[tokio::test]
async fn test_retries_exhausted_surface_concurrency_error() {
    let store = Arc::new(FlakyStore::new(0));
    let ledger = flaky_ledger(Arc::clone(&store), 2);
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;

    store.failures.store(5, Ordering::SeqCst);
    let err = transfer(&ledger, ctx, "1001", "3001", dec!(3.00), date(2024, 6, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::ConcurrentModification));
    assert!(err.is_retryable());
    assert_eq!(store.failures.load(Ordering::SeqCst), 3);
    store.failures.store(0, Ordering::SeqCst);
    assert_eq!(balance(&ledger, ctx, "1001", 0).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_read_overlapping_a_commit_does_not_cache_stale_period() {
    let store = Arc::new(FlakyStore::new(0));
    let ledger = Arc::new(flaky_ledger(Arc::clone(&store), 3));
    let ctx = open(&ledger, date(2024, 6, 1), date(2024, 6, 30)).await;
    let june = ledger.periods(ctx).await.unwrap()[0].id;
    let cash = id(&ledger, ctx, "1001").await;

    store.hold_period_read.store(true, Ordering::SeqCst);
    let reader = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.period(ctx, june).await.unwrap() })
    };
    store.period_read.notified().await;
    transfer(&ledger, ctx, "1001", "3001", dec!(7.00), date(2024, 6, 2))
        .await
        .unwrap();
    store.resume.notify_one();

    let early = reader.await.unwrap();
    assert_eq!(early.holder(cash).balance, Decimal::ZERO);
    let cached = ledger.period(ctx, june).await.unwrap();
    assert_eq!(cached.holder(cash).balance, dec!(7.00));
    assert_eq!(*cached, ledger.periods(ctx).await.unwrap()[0]);
}
