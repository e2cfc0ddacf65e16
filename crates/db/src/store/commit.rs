//! Atomic application of a change set.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IdenStatic, Iterable, QueryFilter, TransactionTrait,
};
use tally_core::period::AccountingPeriod;
use tally_core::store::{ChangeSet, StoreError};
use tracing::debug;

use super::convert::{
    account_set_to_active, account_to_active, balances_to_active, entry_to_active,
    period_to_active, transaction_to_active,
};
use super::store_err;
use crate::entities::{
    account_sets, accounting_periods, accounts, journal_entries, period_balances, transactions,
};

/// Upsert clause replacing every column but the key.
fn replace_on<C: ColumnTrait>(key: C) -> OnConflict {
    OnConflict::column(key)
        .update_columns(C::iter().filter(|c| c.as_str() != key.as_str()))
        .to_owned()
}

/// Writes every staged change in one database transaction.
///
/// # Errors
///
/// Returns [`StoreError::Conflict`] if a period was updated since it was
/// read or a unique key is already taken; nothing is written then.
pub(crate) async fn apply(db: &DatabaseConnection, changes: ChangeSet) -> Result<(), StoreError> {
    let txn = db.begin().await.map_err(store_err)?;

    for set in changes.account_sets.upserts.values() {
        account_sets::Entity::insert(account_set_to_active(set))
            .on_conflict(replace_on(account_sets::Column::Id))
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    for account in changes.accounts.upserts.values() {
        accounts::Entity::insert(account_to_active(account))
            .on_conflict(replace_on(accounts::Column::Id))
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    for period in changes.periods.upserts.values() {
        write_period(&txn, period).await?;
    }

    for entry in changes.journal_entries.upserts.values() {
        journal_entries::Entity::insert(entry_to_active(entry)?)
            .on_conflict(replace_on(journal_entries::Column::Id))
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    for transaction in changes.transactions.upserts.values() {
        transactions::Entity::insert(transaction_to_active(transaction))
            .on_conflict(replace_on(transactions::Column::Id))
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    if !changes.transactions.deletes.is_empty() {
        transactions::Entity::delete_many()
            .filter(
                transactions::Column::Id
                    .is_in(changes.transactions.deletes.iter().map(|id| id.into_inner())),
            )
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    if !changes.journal_entries.deletes.is_empty() {
        journal_entries::Entity::delete_many()
            .filter(
                journal_entries::Column::Id
                    .is_in(changes.journal_entries.deletes.iter().map(|id| id.into_inner())),
            )
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    if !changes.accounts.deletes.is_empty() {
        accounts::Entity::delete_many()
            .filter(
                accounts::Column::Id
                    .is_in(changes.accounts.deletes.iter().map(|id| id.into_inner())),
            )
            .exec(&txn)
            .await
            .map_err(store_err)?;
    }

    txn.commit().await.map_err(store_err)?;

    debug!(
        accounts = changes.accounts.upserts.len() + changes.accounts.deletes.len(),
        periods = changes.periods.upserts.len(),
        entries = changes.journal_entries.upserts.len() + changes.journal_entries.deletes.len(),
        transactions =
            changes.transactions.upserts.len() + changes.transactions.deletes.len(),
        "Change set committed"
    );
    Ok(())
}

/// Updates a period if its stored version still matches, else inserts it.
///
/// The balance rows are replaced wholesale.
async fn write_period(txn: &DatabaseTransaction, period: &AccountingPeriod) -> Result<(), StoreError> {
    let id = period.id.into_inner();

    let result = accounting_periods::Entity::update_many()
        .col_expr(accounting_periods::Column::Name, Expr::value(period.name.clone()))
        .col_expr(accounting_periods::Column::Closed, Expr::value(period.closed))
        .col_expr(
            accounting_periods::Column::Version,
            Expr::col(accounting_periods::Column::Version).add(1),
        )
        .filter(accounting_periods::Column::Id.eq(id))
        .filter(accounting_periods::Column::Version.eq(period.version))
        .exec(txn)
        .await
        .map_err(store_err)?;

    if result.rows_affected == 0 {
        let stored = accounting_periods::Entity::find_by_id(id)
            .one(txn)
            .await
            .map_err(store_err)?;
        if let Some(stored) = stored {
            return Err(StoreError::Conflict(format!(
                "period {} expected version {}, found {}",
                period.id, period.version, stored.version
            )));
        }
        period_to_active(period).insert(txn).await.map_err(store_err)?;
    }

    period_balances::Entity::delete_many()
        .filter(period_balances::Column::PeriodId.eq(id))
        .exec(txn)
        .await
        .map_err(store_err)?;

    let rows = balances_to_active(period);
    if !rows.is_empty() {
        period_balances::Entity::insert_many(rows)
            .exec(txn)
            .await
            .map_err(store_err)?;
    }
    Ok(())
}
