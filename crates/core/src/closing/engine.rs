//! Period closing: transfer temporary accounts into current year profit,
//! verify the books and close the period.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::PeriodSeeding;
use tally_shared::types::AccountingPeriodId;
use tracing::{info, instrument, warn};

use super::category::{CURRENT_YEAR_PROFIT_CODE, TRANSFER_VOUCHER_WORD, TransferCategory};
use super::verify::{verify_equation, verify_transfers, verify_vouchers};
use crate::account::Account;
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::journal::{EntryLine, JournalEntryView, JournalProcessor, Posting};
use crate::period::{AccountingPeriod, PeriodLedger};
use crate::store::UnitOfWork;

/// Result of closing a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingOutcome {
    /// The period, now closed.
    pub closed: AccountingPeriod,
    /// The period after it, found or created.
    pub next: AccountingPeriod,
    /// Transfer entries posted, one per non-empty category.
    pub transfer_entries: Vec<JournalEntryView>,
}

/// Period closing operations.
pub struct ClosingEngine;

impl ClosingEngine {
    /// Closes a period.
    ///
    /// 1. The period must be open and already started.
    /// 2. Each transfer category with non-zero leaf balances gets one entry
    ///    zeroing them against the current year profit account, dated the
    ///    period end or today, whichever is earlier.
    /// 3. Transferred balances, the accounting equation and voucher
    ///    numbering are verified.
    /// 4. The period is marked closed and the next period found or created.
    ///
    /// Everything is staged in `uow`; any error leaves nothing to commit.
    #[instrument(skip(uow))]
    pub async fn close_period(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
        seeding: PeriodSeeding,
    ) -> Result<ClosingOutcome, LedgerError> {
        let period = PeriodLedger::load(uow, ctx, period_id).await?;
        if period.closed {
            return Err(LedgerError::PeriodAlreadyClosed(period_id));
        }
        if ctx.today < period.start_date {
            return Err(LedgerError::PeriodNotStarted {
                start: period.start_date,
                today: ctx.today,
            });
        }

        let transfer_date = period.end_date.min(ctx.today);
        let accounts = uow.accounts(ctx.account_set_id).await?;

        let mut transfer_entries = Vec::new();
        for category in TransferCategory::ALL {
            let Some(view) = Self::transfer_view(ctx, &accounts, &period, category, transfer_date)?
            else {
                continue;
            };
            let posted =
                JournalProcessor::process_as(uow, ctx, view, seeding, Posting::System).await?;
            info!(
                %period_id,
                ?category,
                voucher = ?posted.entry.voucher_num,
                lines = posted.lines.len(),
                "Posted transfer entry"
            );
            transfer_entries.push(posted);
        }

        let mut period = PeriodLedger::load(uow, ctx, period_id).await?;
        if let Err(err) = Self::verify(uow, &accounts, &period).await {
            warn!(%period_id, error = %err, "Period close verification failed");
            return Err(err);
        }

        period.closed = true;
        uow.put_period(period.clone());
        let next = PeriodLedger::find_or_create_next(uow, &period).await?;

        info!(
            %period_id,
            period = %period.name,
            next = %next.name,
            transfers = transfer_entries.len(),
            "Closed accounting period"
        );
        Ok(ClosingOutcome {
            closed: period,
            next,
            transfer_entries,
        })
    }

    /// Builds the transfer entry for one category, or `None` when every
    /// balance in it is already zero.
    ///
    /// Each leaf is booked against its own direction: a positive balance on
    /// the opposite side, a negative one on the same side.
    pub fn transfer_view(
        ctx: RequestContext,
        accounts: &[Account],
        period: &AccountingPeriod,
        category: TransferCategory,
        date: NaiveDate,
    ) -> Result<Option<JournalEntryView>, LedgerError> {
        let description = category.description();
        let mut view = JournalEntryView::new(ctx.account_set_id, TRANSFER_VOUCHER_WORD).dated(date);

        for account in accounts
            .iter()
            .filter(|a| a.is_leaf && category.contains(a.account_type))
        {
            let balance = period.holder(account.id).balance;
            if balance.is_zero() {
                continue;
            }
            let (side, amount) = if balance.is_sign_positive() {
                (account.direction.opposite(), balance)
            } else {
                (account.direction, -balance)
            };
            view.lines
                .push(EntryLine::on_side(side, account.id, amount, description));
        }

        if view.lines.is_empty() {
            return Ok(None);
        }

        let profit = Self::profit_account(accounts)?;
        view.push_balancing_line(profit.id, description);
        Ok(Some(view))
    }

    fn profit_account(accounts: &[Account]) -> Result<&Account, LedgerError> {
        let profit = accounts
            .iter()
            .find(|a| a.code == CURRENT_YEAR_PROFIT_CODE)
            .ok_or_else(|| LedgerError::MissingProfitAccount(CURRENT_YEAR_PROFIT_CODE.to_string()))?;
        if !profit.is_leaf {
            return Err(LedgerError::ProfitAccountNotLeaf(
                CURRENT_YEAR_PROFIT_CODE.to_string(),
            ));
        }
        Ok(profit)
    }

    async fn verify(
        uow: &UnitOfWork,
        accounts: &[Account],
        period: &AccountingPeriod,
    ) -> Result<(), LedgerError> {
        verify_transfers(accounts, period)?;
        verify_equation(accounts, period)?;
        let entries = uow
            .journal_entries_between(period.account_set_id, period.start_date, period.end_date)
            .await?;
        verify_vouchers(&entries)
    }
}
