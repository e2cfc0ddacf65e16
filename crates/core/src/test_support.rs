//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::PeriodSeeding;
use tally_shared::types::AccountId;

use crate::account::{Account, AccountDirectory, AccountSet, standard_chart};
use crate::context::RequestContext;
use crate::journal::{EntryLine, JournalEntryView, JournalProcessor};
use crate::period::AccountingPeriod;
use crate::store::{LedgerStore, MemoryStore, UnitOfWork};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An account set opened on `start` with the standard chart, committed to a memory store.
pub(crate) struct Books {
    pub store: Arc<dyn LedgerStore>,
    pub ctx: RequestContext,
    pub account_set: AccountSet,
    pub first_period: AccountingPeriod,
}

impl Books {
    pub async fn open(start: NaiveDate, today: NaiveDate) -> Self {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let mut uow = UnitOfWork::new(Arc::clone(&store));
        let (account_set, first_period) =
            AccountDirectory::open_account_set(&mut uow, "Demo", start, None, today)
                .await
                .unwrap();
        let ctx = RequestContext::new(account_set.id, today);
        AccountDirectory::import_accounts(&mut uow, ctx, standard_chart())
            .await
            .unwrap();
        store.commit(uow.into_changes()).await.unwrap();
        Self {
            store,
            ctx,
            account_set,
            first_period,
        }
    }

    pub fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }

    pub async fn commit(&self, uow: UnitOfWork) {
        self.store.commit(uow.into_changes()).await.unwrap();
    }

    pub async fn account(&self, code: &str) -> Account {
        self.store
            .accounts(self.account_set.id)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.code == code)
            .unwrap()
    }

    pub async fn id(&self, code: &str) -> AccountId {
        self.account(code).await.id
    }

    pub async fn periods(&self) -> Vec<AccountingPeriod> {
        self.store.periods(self.account_set.id).await.unwrap()
    }

    /// Posts `amount` debit to `debit_code` and credit to `credit_code`, dated `on`.
    pub async fn post(
        &self,
        debit_code: &str,
        credit_code: &str,
        amount: Decimal,
        on: NaiveDate,
    ) -> JournalEntryView {
        let view = JournalEntryView::new(self.account_set.id, "Rec")
            .dated(on)
            .line(EntryLine::debit(self.id(debit_code).await, amount, "debit"))
            .line(EntryLine::credit(self.id(credit_code).await, amount, "credit"));
        let mut uow = self.uow();
        let posted = JournalProcessor::process(&mut uow, self.ctx, view, PeriodSeeding::CarryForward)
            .await
            .unwrap();
        self.commit(uow).await;
        posted
    }
}
