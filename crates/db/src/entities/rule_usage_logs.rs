//! `SeaORM` Entity for rule_usage_logs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UsageOutcome;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_usage_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub rule_code: Option<String>,
    pub rule_version: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub rule_snapshot: Option<Json>,
    pub journal_entry_id: Option<Uuid>,
    pub source_type: String,
    pub source_id: String,
    pub trigger_event: String,
    pub outcome: UsageOutcome,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
