//! `SeaORM` Entity for accounting_periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounting_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_set_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub closed: bool,
    /// Bumped by every update; writers filter on the version they read.
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_sets::Entity",
        from = "Column::AccountSetId",
        to = "super::account_sets::Column::Id"
    )]
    AccountSets,
    #[sea_orm(has_many = "super::period_balances::Entity")]
    PeriodBalances,
}

impl Related<super::account_sets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountSets.def()
    }
}

impl Related<super::period_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodBalances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
