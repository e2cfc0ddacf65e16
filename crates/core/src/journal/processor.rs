//! Journal entry processor: the only writer of entries and transactions.
//!
//! An entry moves `received -> validated -> persisted`, or is rejected with
//! no side effects. Every balance change goes through the period ledger
//! inside the caller's unit of work.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tally_shared::PeriodSeeding;
use tally_shared::types::{AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId};
use tracing::{info, instrument};

use super::template::AutoEntryTemplate;
use super::types::{EntryLine, JournalEntry, JournalEntryView, Transaction};
use super::validation::validate_lines;
use crate::account::{AccountDirectory, Direction};
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::period::{PeriodLedger, month_end, month_start};
use crate::store::UnitOfWork;

/// Who is posting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posting {
    /// A caller-submitted entry; inactive accounts are rejected.
    User,
    /// A system-generated entry such as a closing transfer.
    System,
}

/// Journal entry processor operations.
pub struct JournalProcessor;

impl JournalProcessor {
    /// Validates and persists a journal entry, returning the stored view.
    ///
    /// 1. The entry must belong to the caller's account set.
    /// 2. Its date cannot be after today.
    /// 3. Debits must equal credits, before anything is read or written.
    /// 4. New entries get an id and today's creation date; voucher numbers
    ///    are assigned as the period's highest plus one when absent.
    /// 5. Periods are created through the entry's date.
    /// 6. New lines post their full amounts; changed lines post the difference.
    /// 7. Lines dropped from the entry are reversed and deleted.
    #[instrument(skip(uow, view), fields(entry_id = ?view.entry.id, lines = view.lines.len()))]
    pub async fn process(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        view: JournalEntryView,
        seeding: PeriodSeeding,
    ) -> Result<JournalEntryView, LedgerError> {
        Self::process_as(uow, ctx, view, seeding, Posting::User).await
    }

    /// [`Self::process`] with an explicit poster.
    pub async fn process_as(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        view: JournalEntryView,
        seeding: PeriodSeeding,
        posting: Posting,
    ) -> Result<JournalEntryView, LedgerError> {
        let account_set_id = view.entry.account_set_id;
        ctx.ensure_tenant(account_set_id)?;

        if let Some(date) = view.entry.modified_date {
            if date > ctx.today {
                return Err(LedgerError::FutureDated {
                    date,
                    today: ctx.today,
                });
            }
        }

        let lines = validate_lines(&view.lines)?;
        let mut seen = BTreeSet::new();
        for id in lines.iter().filter_map(|l| l.id) {
            if !seen.insert(id) {
                return Err(LedgerError::DuplicateLine(id));
            }
        }
        let directions = Self::posting_accounts(uow, ctx, &lines, posting).await?;

        let existing = match view.entry.id {
            Some(id) => Some(Self::load_entry(uow, ctx, id).await?),
            None => None,
        };
        let entry_id = existing.as_ref().map_or_else(JournalEntryId::new, |e| e.id);
        let created_date = existing.as_ref().map_or(ctx.today, |e| e.created_date);
        let modified_date = view
            .entry
            .modified_date
            .or(existing.as_ref().map(|e| e.modified_date))
            .unwrap_or(ctx.today);
        let voucher_num = Self::assign_voucher(
            uow,
            account_set_id,
            entry_id,
            existing.as_ref(),
            view.entry.voucher_num,
            modified_date,
        )
        .await?;

        PeriodLedger::ensure_periods_through(uow, account_set_id, modified_date, seeding).await?;

        let mut previous: BTreeMap<TransactionId, Transaction> = match &existing {
            Some(entry) => uow
                .transactions_for_entry(entry.id)
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect(),
            None => BTreeMap::new(),
        };

        let mut transaction_ids = Vec::with_capacity(lines.len());
        for line in lines {
            let direction = directions
                .get(&line.account_id)
                .copied()
                .ok_or(LedgerError::AccountNotFound(line.account_id))?;

            let transaction = match line.id {
                None => {
                    let transaction = Transaction {
                        id: TransactionId::new(),
                        journal_entry_id: entry_id,
                        account_id: line.account_id,
                        account_set_id,
                        created_date,
                        modified_date,
                        description: line.description,
                        debit: line.debit,
                        credit: line.credit,
                    };
                    PeriodLedger::apply_delta(
                        uow,
                        transaction.account_id,
                        direction,
                        transaction.debit,
                        transaction.credit,
                        modified_date,
                    )
                    .await?;
                    transaction
                }
                Some(id) => {
                    let Some(old) = previous.remove(&id) else {
                        return Err(Self::unknown_line(uow, id).await);
                    };
                    let updated = Transaction {
                        account_id: line.account_id,
                        modified_date,
                        description: line.description,
                        debit: line.debit,
                        credit: line.credit,
                        ..old.clone()
                    };
                    Self::apply_change(uow, &old, &updated, direction).await?;
                    updated
                }
            };
            transaction_ids.push(transaction.id);
            uow.put_transaction(transaction);
        }

        for (id, old) in previous {
            Self::reverse(uow, &old).await?;
            uow.delete_transaction(id);
        }

        let entry = JournalEntry {
            id: entry_id,
            account_set_id,
            created_date,
            modified_date,
            voucher_word: view.entry.voucher_word,
            voucher_num,
            transaction_ids,
        };
        uow.put_journal_entry(entry.clone());

        let transactions = uow.transactions_for_entry(entry_id).await?;
        info!(
            %entry_id,
            voucher = %format!("{}-{}", entry.voucher_word, entry.voucher_num),
            date = %modified_date,
            lines = transactions.len(),
            "Persisted journal entry"
        );
        Ok(JournalEntryView::from_stored(&entry, &transactions))
    }

    /// Reverses every line of an entry and deletes the entry.
    #[instrument(skip(uow))]
    pub async fn delete_entry(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        entry_id: JournalEntryId,
    ) -> Result<(), LedgerError> {
        Self::load_entry(uow, ctx, entry_id).await?;
        for transaction in uow.transactions_for_entry(entry_id).await? {
            Self::reverse(uow, &transaction).await?;
            uow.delete_transaction(transaction.id);
        }
        uow.delete_journal_entry(entry_id);
        info!(%entry_id, "Deleted journal entry");
        Ok(())
    }

    /// Loads the stored view of an entry.
    pub async fn entry_view(
        uow: &UnitOfWork,
        ctx: RequestContext,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntryView, LedgerError> {
        let entry = Self::load_entry(uow, ctx, entry_id).await?;
        let transactions = uow.transactions_for_entry(entry_id).await?;
        Ok(JournalEntryView::from_stored(&entry, &transactions))
    }

    /// Renumbers a period's vouchers 1..n by date, then creation date.
    #[instrument(skip(uow))]
    pub async fn reorder_voucher_numbers(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let period = PeriodLedger::load(uow, ctx, period_id).await?;
        let mut entries = uow
            .journal_entries_between(period.account_set_id, period.start_date, period.end_date)
            .await?;
        entries.sort_by_key(|e| (e.modified_date, e.created_date, e.voucher_num, e.id));

        for (voucher_num, entry) in (1..).zip(entries.iter_mut()) {
            if entry.voucher_num != voucher_num {
                entry.voucher_num = voucher_num;
                uow.put_journal_entry(entry.clone());
            }
        }
        info!(%period_id, entries = entries.len(), "Renumbered vouchers");
        Ok(entries)
    }

    /// Builds an entry from a template using the period containing `date`, then processes it.
    #[instrument(skip(uow, template), fields(template = %template.name))]
    pub async fn generate_from_template(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        template: &AutoEntryTemplate,
        date: NaiveDate,
        seeding: PeriodSeeding,
    ) -> Result<JournalEntryView, LedgerError> {
        PeriodLedger::ensure_periods_through(uow, ctx.account_set_id, date, seeding).await?;
        let period = uow
            .periods(ctx.account_set_id)
            .await?
            .into_iter()
            .find(|p| p.contains_date(date))
            .ok_or(LedgerError::NoLines)?;
        let view = template.build(ctx.account_set_id, &period, date)?;
        Self::process(uow, ctx, view, seeding).await
    }

    /// Loads an entry of the caller's account set.
    pub async fn load_entry(
        uow: &UnitOfWork,
        ctx: RequestContext,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = uow
            .journal_entry(entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        ctx.ensure_tenant(entry.account_set_id)?;
        Ok(entry)
    }

    /// Checks every posted account and returns its direction.
    async fn posting_accounts(
        uow: &UnitOfWork,
        ctx: RequestContext,
        lines: &[EntryLine],
        posting: Posting,
    ) -> Result<BTreeMap<AccountId, Direction>, LedgerError> {
        let mut directions = BTreeMap::new();
        for line in lines {
            if directions.contains_key(&line.account_id) {
                continue;
            }
            let account = AccountDirectory::load(uow, ctx, line.account_id).await?;
            if !account.is_leaf {
                return Err(LedgerError::NonLeafAccount(account.id));
            }
            if posting == Posting::User && !account.is_active() {
                return Err(LedgerError::AccountInactive(account.id));
            }
            directions.insert(account.id, account.direction);
        }
        Ok(directions)
    }

    async fn assign_voucher(
        uow: &UnitOfWork,
        account_set_id: AccountSetId,
        entry_id: JournalEntryId,
        existing: Option<&JournalEntry>,
        requested: Option<i32>,
        date: NaiveDate,
    ) -> Result<i32, LedgerError> {
        let siblings: Vec<JournalEntry> = uow
            .journal_entries_between(account_set_id, month_start(date), month_end(date))
            .await?
            .into_iter()
            .filter(|e| e.id != entry_id)
            .collect();
        let taken = |num: i32| siblings.iter().any(|e| e.voucher_num == num);

        if let Some(num) = requested {
            if num < 1 {
                return Err(LedgerError::InvalidVoucherNumber(num));
            }
            if taken(num) {
                return Err(LedgerError::DuplicateVoucher(num));
            }
            return Ok(num);
        }

        if let Some(entry) = existing {
            if month_start(entry.modified_date) == month_start(date) && !taken(entry.voucher_num) {
                return Ok(entry.voucher_num);
            }
        }

        Ok(siblings.iter().map(|e| e.voucher_num).max().unwrap_or(0) + 1)
    }

    async fn apply_change(
        uow: &mut UnitOfWork,
        old: &Transaction,
        new: &Transaction,
        direction: Direction,
    ) -> Result<(), LedgerError> {
        if old.account_id != new.account_id || old.modified_date != new.modified_date {
            Self::reverse(uow, old).await?;
            PeriodLedger::apply_delta(
                uow,
                new.account_id,
                direction,
                new.debit,
                new.credit,
                new.modified_date,
            )
            .await
        } else {
            PeriodLedger::apply_delta(
                uow,
                new.account_id,
                direction,
                new.debit - old.debit,
                new.credit - old.credit,
                new.modified_date,
            )
            .await
        }
    }

    async fn reverse(uow: &mut UnitOfWork, transaction: &Transaction) -> Result<(), LedgerError> {
        let account = uow
            .account(transaction.account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(transaction.account_id))?;
        PeriodLedger::apply_delta(
            uow,
            account.id,
            account.direction,
            -transaction.debit,
            -transaction.credit,
            transaction.modified_date,
        )
        .await
    }

    async fn unknown_line(uow: &UnitOfWork, id: TransactionId) -> LedgerError {
        match uow.transaction(id).await {
            Ok(Some(_)) => LedgerError::ForeignLine(id),
            Ok(None) => LedgerError::TransactionNotFound(id),
            Err(err) => err.into(),
        }
    }
}
