//! `SeaORM` Entity for journal_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_set_id: Uuid,
    pub created_date: Date,
    pub modified_date: Date,
    pub voucher_word: String,
    pub voucher_num: i32,
    /// Line ids in submission order.
    #[sea_orm(column_type = "JsonBinary")]
    pub transaction_ids: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_sets::Entity",
        from = "Column::AccountSetId",
        to = "super::account_sets::Column::Id"
    )]
    AccountSets,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::account_sets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountSets.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
