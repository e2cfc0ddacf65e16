//! Postgres ledger store.
//!
//! [`SeaLedgerStore`] implements the core [`LedgerStore`] boundary over a
//! `SeaORM` connection. Period holders live in `period_balances`, one row per
//! account; a commit runs in one database transaction and guards every
//! period update with the version the writer read.

mod commit;
mod convert;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr,
};
use tally_core::account::{Account, AccountSet};
use tally_core::journal::{JournalEntry, Transaction};
use tally_core::period::AccountingPeriod;
use tally_core::store::{ChangeSet, LedgerStore, StoreError};
use tally_shared::types::{
    AccountId, AccountSetId, AccountingPeriodId, JournalEntryId, TransactionId,
};
use uuid::Uuid;

use crate::entities::{
    account_sets, accounting_periods, accounts, journal_entries, period_balances, transactions,
};
use convert::{
    account_from_model, account_set_from_model, entry_from_model, period_from_models,
    transaction_from_model,
};

/// Maps a database error onto the store boundary.
///
/// Unique violations mean another writer got there first.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => StoreError::Backend(err.to_string()),
    }
}

/// A [`LedgerStore`] backed by a `SeaORM` database connection.
#[derive(Debug, Clone)]
pub struct SeaLedgerStore {
    db: DatabaseConnection,
}

impl SeaLedgerStore {
    /// Creates a store over an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn balances_by_period(
        &self,
        period_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<period_balances::Model>>, StoreError> {
        let mut grouped: HashMap<Uuid, Vec<period_balances::Model>> = HashMap::new();
        if period_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = period_balances::Entity::find()
            .filter(period_balances::Column::PeriodId.is_in(period_ids))
            .all(&self.db)
            .await
            .map_err(store_err)?;
        for row in rows {
            grouped.entry(row.period_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl LedgerStore for SeaLedgerStore {
    async fn account_set(&self, id: AccountSetId) -> Result<Option<AccountSet>, StoreError> {
        let model = account_sets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(account_set_from_model))
    }

    async fn account_set_by_name(&self, name: &str) -> Result<Option<AccountSet>, StoreError> {
        let model = account_sets::Entity::find()
            .filter(account_sets::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(account_set_from_model))
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(account_from_model)
            .transpose()
    }

    async fn accounts(&self, account_set_id: AccountSetId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountSetId.eq(account_set_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(transaction_from_model))
    }

    async fn transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(transaction_from_model).collect())
    }

    async fn transactions_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::JournalEntryId.eq(entry_id.into_inner()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(transaction_from_model).collect())
    }

    async fn journal_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(entry_from_model)
            .transpose()
    }

    async fn journal_entries_between(
        &self,
        account_set_id: AccountSetId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        journal_entries::Entity::find()
            .filter(journal_entries::Column::AccountSetId.eq(account_set_id.into_inner()))
            .filter(journal_entries::Column::ModifiedDate.between(from, to))
            .order_by_asc(journal_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(entry_from_model)
            .collect()
    }

    async fn period(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, StoreError> {
        let Some(model) = accounting_periods::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
        else {
            return Ok(None);
        };

        let mut balances = self.balances_by_period(vec![model.id]).await?;
        let rows = balances.remove(&model.id).unwrap_or_default();
        Ok(Some(period_from_models(model, rows)))
    }

    async fn periods(
        &self,
        account_set_id: AccountSetId,
    ) -> Result<Vec<AccountingPeriod>, StoreError> {
        let models = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::AccountSetId.eq(account_set_id.into_inner()))
            .order_by_asc(accounting_periods::Column::StartDate)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        let mut balances = self
            .balances_by_period(models.iter().map(|m| m.id).collect())
            .await?;
        Ok(models
            .into_iter()
            .map(|model| {
                let rows = balances.remove(&model.id).unwrap_or_default();
                period_from_models(model, rows)
            })
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        commit::apply(&self.db, changes).await
    }
}
