//! `SeaORM` Entity for period_balances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "period_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub account_id: Uuid,
    pub fiscal_year: i32,
    pub period_month: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub opening: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub period_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub period_credit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub closing: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
