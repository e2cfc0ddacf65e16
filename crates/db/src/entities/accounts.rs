//! `SeaORM` Entity for accounts table.
//!
//! Type, direction and state are stored as their lowercase names.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_set_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub direction: String,
    pub state: String,
    pub level: i16,
    pub parent_id: Option<Uuid>,
    pub is_leaf: bool,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub initial_balance: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_sets::Entity",
        from = "Column::AccountSetId",
        to = "super::account_sets::Column::Id"
    )]
    AccountSets,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
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
