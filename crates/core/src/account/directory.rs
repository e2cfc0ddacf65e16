//! Account directory: the chart-of-accounts tree.
//!
//! Owns every topology edit. A leaf is an account no other account lists
//! as parent; only leaves carry transactions. Giving a leaf its first child
//! moves the leaf's transactions and holders onto that child.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tally_shared::types::{AccountId, AccountSetId, round_money};
use tracing::{info, instrument};

use super::code::{MAX_LEVEL, parent_code, resolve_level_and_validate};
use super::types::{
    Account, AccountDraft, AccountPatch, AccountSet, AccountState, AccountType, ImportReport,
    NewAccount,
};
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::period::{AccountingPeriod, PeriodLedger, month_start};
use crate::store::UnitOfWork;

/// Account directory operations.
pub struct AccountDirectory;

impl AccountDirectory {
    /// Opens a new account set with its first accounting period.
    #[instrument(skip(uow, description))]
    pub async fn open_account_set(
        uow: &mut UnitOfWork,
        name: &str,
        start_date: NaiveDate,
        description: Option<String>,
        today: NaiveDate,
    ) -> Result<(AccountSet, AccountingPeriod), LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if uow.account_set_by_name(name).await?.is_some() {
            return Err(LedgerError::DuplicateAccountSetName(name.to_string()));
        }

        let account_set = AccountSet {
            id: AccountSetId::new(),
            name: name.to_string(),
            start_date: month_start(start_date),
            description,
            created_date: today,
        };
        let period = AccountingPeriod::for_month(account_set.id, start_date, BTreeMap::new());

        uow.put_account_set(account_set.clone());
        uow.put_period(period.clone());
        info!(account_set_id = %account_set.id, period = %period.name, "Opened account set");
        Ok((account_set, period))
    }

    /// Loads an account of the caller's account set.
    pub async fn load(
        uow: &UnitOfWork,
        ctx: RequestContext,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        let account = uow
            .account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        ctx.ensure_tenant(account.account_set_id)?;
        Ok(account)
    }

    /// Returns the account followed by every ancestor up to level 1.
    pub async fn ancestors_of(
        uow: &UnitOfWork,
        account_id: AccountId,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut chain: Vec<Account> = Vec::new();
        let mut next = Some(account_id);

        while let Some(id) = next {
            let account = match (uow.account(id).await?, chain.last()) {
                (Some(account), _) => account,
                (None, None) => return Err(LedgerError::AccountNotFound(id)),
                (None, Some(child)) => return Err(LedgerError::BrokenHierarchy(child.id)),
            };
            if chain.len() >= usize::from(MAX_LEVEL) || chain.iter().any(|a| a.id == account.id) {
                return Err(LedgerError::BrokenHierarchy(account.id));
            }
            next = account.parent_id;
            chain.push(account);
        }
        Ok(chain)
    }

    /// True if the account is at the deepest level or nothing lists it as parent.
    #[must_use]
    pub fn is_leaf(account: &Account, accounts: &[Account]) -> bool {
        account.level >= MAX_LEVEL || !accounts.iter().any(|a| a.parent_id == Some(account.id))
    }

    /// Accounts whose name or code matches `query`, ordered by code.
    #[must_use]
    pub fn search(accounts: &[Account], query: &str) -> Vec<Account> {
        let mut found: Vec<Account> = accounts.iter().filter(|a| a.matches(query)).cloned().collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        found
    }

    /// Creates an account.
    ///
    /// If the parent was a leaf, its transactions and holders move to the
    /// new account and the parent stops being a leaf. The opening balance is
    /// seeded into every period for the account and its ancestors.
    #[instrument(skip(uow, new), fields(code = %new.code))]
    pub async fn create_account(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        new: NewAccount,
    ) -> Result<Account, LedgerError> {
        let account_set_id = ctx.account_set_id;
        if uow.account_set(account_set_id).await?.is_none() {
            return Err(LedgerError::AccountSetNotFound(account_set_id));
        }

        let level = resolve_level_and_validate(&new.code, new.level)?;
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }

        let existing = uow.accounts(account_set_id).await?;
        ensure_unique(&existing, None, &new.code, &name, new.account_type)?;
        let parent = Self::resolve_parent(uow, ctx, &new.code, new.parent_id, &existing).await?;

        let direction = new
            .direction
            .or(parent.as_ref().map(|p| p.direction))
            .unwrap_or_else(|| new.account_type.default_direction());

        let account = Account {
            id: AccountId::new(),
            account_set_id,
            code: new.code,
            name,
            account_type: new.account_type,
            direction,
            state: AccountState::Active,
            level,
            parent_id: parent.as_ref().map(|p| p.id),
            is_leaf: true,
            initial_balance: round_money(new.initial_balance),
        };

        let mut chain = vec![account.id];
        if let Some(mut parent) = parent {
            if parent.is_leaf {
                for mut transaction in uow.transactions_for_account(parent.id).await? {
                    transaction.account_id = account.id;
                    uow.put_transaction(transaction);
                }
                PeriodLedger::copy_holders(uow, account_set_id, parent.id, account.id).await?;
                parent.is_leaf = false;
                info!(parent = %parent.code, child = %account.code, "Moved leaf contents to new sub-account");
                uow.put_account(parent.clone());
            }
            chain.extend(Self::ancestors_of(uow, parent.id).await?.iter().map(|a| a.id));
        }

        uow.put_account(account.clone());
        PeriodLedger::seed_opening_balance(uow, account_set_id, &chain, account.initial_balance)
            .await?;

        info!(account_id = %account.id, code = %account.code, "Created account");
        Ok(account)
    }

    async fn resolve_parent(
        uow: &UnitOfWork,
        ctx: RequestContext,
        code: &str,
        explicit: Option<AccountId>,
        existing: &[Account],
    ) -> Result<Option<Account>, LedgerError> {
        let expected = parent_code(code);

        let parent = match (explicit, expected) {
            (None, None) => return Ok(None),
            (Some(id), _) => Self::load(uow, ctx, id).await?,
            (None, Some(expected)) => existing
                .iter()
                .find(|a| a.code == expected)
                .cloned()
                .ok_or_else(|| LedgerError::ParentNotFound(expected.to_string()))?,
        };

        if expected != Some(parent.code.as_str()) {
            return Err(LedgerError::ParentCodeMismatch {
                code: code.to_string(),
                parent_code: parent.code,
            });
        }
        Ok(Some(parent))
    }

    /// Applies a partial update to an account.
    #[instrument(skip(uow, patch))]
    pub async fn update_account(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        account_id: AccountId,
        patch: AccountPatch,
    ) -> Result<Account, LedgerError> {
        let mut account = Self::load(uow, ctx, account_id).await?;
        let accounts = uow.accounts(ctx.account_set_id).await?;

        if let Some(code) = patch.code.filter(|c| *c != account.code) {
            if accounts.iter().any(|a| a.parent_id == Some(account_id)) {
                return Err(LedgerError::CodeChangeWithChildren(account_id));
            }
            resolve_level_and_validate(&code, Some(account.level))?;
            if let Some(parent_id) = account.parent_id {
                let parent = accounts
                    .iter()
                    .find(|a| a.id == parent_id)
                    .ok_or(LedgerError::BrokenHierarchy(account_id))?;
                if parent_code(&code) != Some(parent.code.as_str()) {
                    return Err(LedgerError::ParentCodeMismatch {
                        code,
                        parent_code: parent.code.clone(),
                    });
                }
            }
            account.code = code;
        }

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(LedgerError::EmptyName);
            }
            account.name = name;
        }
        if let Some(account_type) = patch.account_type {
            account.account_type = account_type;
        }
        if let Some(direction) = patch.direction.filter(|d| *d != account.direction) {
            // Holders were accumulated with the old direction.
            if !uow.transactions_for_account(account_id).await?.is_empty() {
                return Err(LedgerError::AccountHasTransactions(account_id));
            }
            account.direction = direction;
        }
        if let Some(state) = patch.state {
            account.state = state;
        }

        ensure_unique(
            &accounts,
            Some(account_id),
            &account.code,
            &account.name,
            account.account_type,
        )?;

        uow.put_account(account.clone());
        info!(%account_id, code = %account.code, "Updated account");
        Ok(account)
    }

    /// Deletes an account with no sub-accounts and no transactions.
    ///
    /// The opening balance is withdrawn from the ancestors, and the parent
    /// becomes a leaf again when this was its last child.
    #[instrument(skip(uow))]
    pub async fn delete_account(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        let account = Self::load(uow, ctx, account_id).await?;
        let accounts = uow.accounts(ctx.account_set_id).await?;

        if accounts.iter().any(|a| a.parent_id == Some(account_id)) {
            return Err(LedgerError::AccountHasChildren(account_id));
        }
        if !uow.transactions_for_account(account_id).await?.is_empty() {
            return Err(LedgerError::AccountHasTransactions(account_id));
        }

        let ancestors: Vec<AccountId> = Self::ancestors_of(uow, account_id)
            .await?
            .iter()
            .skip(1)
            .map(|a| a.id)
            .collect();
        PeriodLedger::seed_opening_balance(
            uow,
            ctx.account_set_id,
            &ancestors,
            -account.initial_balance,
        )
        .await?;
        PeriodLedger::drop_holders(uow, ctx.account_set_id, account_id).await?;
        uow.delete_account(account_id);

        if let Some(parent_id) = account.parent_id {
            let has_siblings = accounts
                .iter()
                .any(|a| a.parent_id == Some(parent_id) && a.id != account_id);
            if !has_siblings {
                if let Some(mut parent) = accounts.into_iter().find(|a| a.id == parent_id) {
                    parent.is_leaf = true;
                    uow.put_account(parent);
                }
            }
        }

        info!(%account_id, code = %account.code, "Deleted account");
        Ok(())
    }

    /// Creates accounts from import drafts, shallowest level first.
    ///
    /// Drafts whose code already exists are mapped to the existing account
    /// instead of being created again.
    #[instrument(skip(uow, drafts), fields(count = drafts.len()))]
    pub async fn import_accounts(
        uow: &mut UnitOfWork,
        ctx: RequestContext,
        mut drafts: Vec<AccountDraft>,
    ) -> Result<ImportReport, LedgerError> {
        drafts.sort_by_key(|d| d.code.len());

        let mut codes: BTreeMap<String, AccountId> = uow
            .accounts(ctx.account_set_id)
            .await?
            .into_iter()
            .map(|a| (a.code, a.id))
            .collect();

        let mut report = ImportReport::default();
        for draft in drafts {
            if let Some(id) = codes.get(&draft.code) {
                report.reconciled.push((draft.code, *id));
                continue;
            }
            let account = Self::create_account(uow, ctx, draft.into()).await?;
            codes.insert(account.code.clone(), account.id);
            report.created.push(account);
        }

        info!(
            created = report.created.len(),
            reconciled = report.reconciled.len(),
            "Imported accounts"
        );
        Ok(report)
    }
}

fn ensure_unique(
    accounts: &[Account],
    skip: Option<AccountId>,
    code: &str,
    name: &str,
    account_type: AccountType,
) -> Result<(), LedgerError> {
    let others = accounts.iter().filter(|a| Some(a.id) != skip);
    for other in others {
        if other.code == code {
            return Err(LedgerError::DuplicateAccountCode(code.to_string()));
        }
        if other.name == name && other.account_type == account_type {
            return Err(LedgerError::DuplicateAccountName {
                name: name.to_string(),
                account_type,
            });
        }
    }
    Ok(())
}
