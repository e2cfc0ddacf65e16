//! Period ledger: the only writer of amount holders.
//!
//! Holders are cumulative. A delta dated `d` lands in every period whose
//! end date is on or after `d`, for the posted account and each of its
//! ancestors. All writes are staged in the caller's unit of work, so a
//! fan-out either commits whole or not at all.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tally_shared::PeriodSeeding;
use tally_shared::types::{AccountId, AccountSetId, AccountingPeriodId};
use tracing::{debug, info};

use super::calendar::next_month_start;
use super::types::{AccountingPeriod, BalanceRow};
use crate::account::{Account, AccountDirectory, Direction};
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::store::UnitOfWork;

/// Period ledger operations.
pub struct PeriodLedger;

impl PeriodLedger {
    /// Applies a debit/credit delta to an account and all its ancestors.
    ///
    /// Every period with `end_date >= effective_date` is updated; holders
    /// missing from a period are created at zero first. The balance moves by
    /// `debit - credit` when `direction` is debit-normal, else `credit - debit`.
    pub async fn apply_delta(
        uow: &mut UnitOfWork,
        account_id: AccountId,
        direction: Direction,
        debit_delta: Decimal,
        credit_delta: Decimal,
        effective_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        if debit_delta.is_zero() && credit_delta.is_zero() {
            return Ok(());
        }

        let chain = AccountDirectory::ancestors_of(uow, account_id).await?;
        let account_set_id = chain[0].account_set_id;

        let mut touched = 0usize;
        for mut period in uow.periods(account_set_id).await? {
            if period.end_date < effective_date {
                continue;
            }
            for account in &chain {
                period
                    .holders
                    .entry(account.id)
                    .or_default()
                    .apply(direction, debit_delta, credit_delta);
            }
            uow.put_period(period);
            touched += 1;
        }

        debug!(
            %account_id,
            %debit_delta,
            %credit_delta,
            %effective_date,
            accounts = chain.len(),
            periods = touched,
            "Applied delta"
        );
        Ok(())
    }

    /// Adds an opening balance to the listed accounts in every period.
    ///
    /// Only the balance moves; debit and credit totals track posted lines.
    pub async fn seed_opening_balance(
        uow: &mut UnitOfWork,
        account_set_id: AccountSetId,
        chain: &[AccountId],
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        for mut period in uow.periods(account_set_id).await? {
            for id in chain {
                period.holders.entry(*id).or_default().balance += amount;
            }
            uow.put_period(period);
        }
        Ok(())
    }

    /// Copies an account's holders to another account in every period.
    pub async fn copy_holders(
        uow: &mut UnitOfWork,
        account_set_id: AccountSetId,
        from: AccountId,
        to: AccountId,
    ) -> Result<(), LedgerError> {
        for mut period in uow.periods(account_set_id).await? {
            if let Some(holder) = period.holders.get(&from).copied() {
                period.holders.insert(to, holder);
                uow.put_period(period);
            }
        }
        Ok(())
    }

    /// Removes an account's holders from every period.
    pub async fn drop_holders(
        uow: &mut UnitOfWork,
        account_set_id: AccountSetId,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        for mut period in uow.periods(account_set_id).await? {
            if period.holders.remove(&account_id).is_some() {
                uow.put_period(period);
            }
        }
        Ok(())
    }

    /// Creates the monthly periods needed so that one covers `date`.
    ///
    /// With no period yet, only the month containing `date` is created.
    /// Otherwise months are appended after the latest period through the
    /// month containing `date`, seeded per `seeding`. Returns the created periods.
    pub async fn ensure_periods_through(
        uow: &mut UnitOfWork,
        account_set_id: AccountSetId,
        date: NaiveDate,
        seeding: PeriodSeeding,
    ) -> Result<Vec<AccountingPeriod>, LedgerError> {
        let periods = uow.periods(account_set_id).await?;

        let Some(mut latest) = periods.last().cloned() else {
            let period = AccountingPeriod::for_month(account_set_id, date, BTreeMap::new());
            info!(%account_set_id, period = %period.name, "Created first accounting period");
            uow.put_period(period.clone());
            return Ok(vec![period]);
        };

        let mut created = Vec::new();
        while latest.end_date < date {
            let holders = match seeding {
                PeriodSeeding::CarryForward => latest.holders.clone(),
                PeriodSeeding::Zero => BTreeMap::new(),
            };
            let next = AccountingPeriod::for_month(
                account_set_id,
                next_month_start(latest.start_date),
                holders,
            );
            info!(%account_set_id, period = %next.name, ?seeding, "Created accounting period");
            uow.put_period(next.clone());
            created.push(next.clone());
            latest = next;
        }
        Ok(created)
    }

    /// Returns the period after `period`, creating it from `period`'s holders if missing.
    ///
    /// An existing next period already holds cumulative totals and is returned unchanged.
    pub async fn find_or_create_next(
        uow: &mut UnitOfWork,
        period: &AccountingPeriod,
    ) -> Result<AccountingPeriod, LedgerError> {
        let start = next_month_start(period.start_date);
        if let Some(existing) = uow
            .periods(period.account_set_id)
            .await?
            .into_iter()
            .find(|p| p.start_date == start)
        {
            return Ok(existing);
        }

        let next = AccountingPeriod::for_month(period.account_set_id, start, period.holders.clone());
        info!(account_set_id = %period.account_set_id, period = %next.name, "Created next accounting period");
        uow.put_period(next.clone());
        Ok(next)
    }

    /// Loads a period of the caller's account set.
    pub async fn load(
        uow: &UnitOfWork,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, LedgerError> {
        let period = uow
            .period(period_id)
            .await?
            .ok_or(LedgerError::PeriodNotFound(period_id))?;
        ctx.ensure_tenant(period.account_set_id)?;
        Ok(period)
    }

    /// Reopens a closed period and every later closed period.
    pub async fn reopen_period(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<AccountingPeriod>, LedgerError> {
        let period = Self::load(uow, ctx, period_id).await?;
        if !period.closed {
            return Err(LedgerError::PeriodNotClosed(period_id));
        }

        let mut reopened = Vec::new();
        for mut later in uow.periods(period.account_set_id).await? {
            if later.start_date >= period.start_date && later.closed {
                later.closed = false;
                uow.put_period(later.clone());
                reopened.push(later);
            }
        }
        info!(%period_id, count = reopened.len(), "Reopened accounting periods");
        Ok(reopened)
    }

    /// Raw balance rows for every account, ordered by code.
    #[must_use]
    pub fn balance_rows(accounts: &[Account], period: &AccountingPeriod) -> Vec<BalanceRow> {
        let mut rows: Vec<BalanceRow> = accounts
            .iter()
            .map(|account| BalanceRow::new(account, period))
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        rows
    }
}
