//! Rule usage log repository. Records are append-only.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use ledgerflow_core::audit::{RuleUsageLog, UsageLogFilter};
use ledgerflow_core::engine::StoreError;
use ledgerflow_shared::types::{CompanyId, JournalEntryId, PostingRuleId, RuleUsageLogId};

use crate::entities::{rule_usage_logs, sea_orm_active_enums::UsageOutcome};
use crate::error::store_error;

/// Rule usage log repository.
#[derive(Debug, Clone, Copy)]
pub struct UsageLogRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UsageLogRepository<'a, C> {
    /// Creates a new usage log repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Appends a record.
    pub async fn insert(&self, log: &RuleUsageLog) -> Result<(), StoreError> {
        let model = rule_usage_logs::ActiveModel {
            id: Set(log.id.into_inner()),
            company_id: Set(log.company_id.into_inner()),
            rule_id: Set(log.rule_id.map(PostingRuleId::into_inner)),
            rule_code: Set(log.rule_code.clone()),
            rule_version: Set(log.rule_version),
            rule_snapshot: Set(log.rule_snapshot.clone()),
            journal_entry_id: Set(log.journal_entry_id.map(JournalEntryId::into_inner)),
            source_type: Set(log.source_type.clone()),
            source_id: Set(log.source_id.clone()),
            trigger_event: Set(log.trigger_event.clone()),
            outcome: Set(log.outcome.into()),
            error_message: Set(log.error_message.clone()),
            created_at: Set(log.created_at.into()),
        };
        model.insert(self.conn).await.map_err(store_error)?;
        Ok(())
    }

    /// Lists a company's records, newest first.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &UsageLogFilter,
        limit: u64,
    ) -> Result<Vec<RuleUsageLog>, StoreError> {
        let mut query = rule_usage_logs::Entity::find()
            .filter(rule_usage_logs::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(outcome) = filter.outcome {
            query = query.filter(rule_usage_logs::Column::Outcome.eq(UsageOutcome::from(outcome)));
        }
        if let Some(source_type) = &filter.source_type {
            query = query.filter(rule_usage_logs::Column::SourceType.eq(source_type.as_str()));
        }
        if let Some(rule_code) = &filter.rule_code {
            query = query.filter(rule_usage_logs::Column::RuleCode.eq(rule_code.as_str()));
        }
        let rows = query
            .order_by_desc(rule_usage_logs::Column::CreatedAt)
            .order_by_desc(rule_usage_logs::Column::Id)
            .limit(limit)
            .all(self.conn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(to_domain).collect())
    }
}

fn to_domain(model: rule_usage_logs::Model) -> RuleUsageLog {
    RuleUsageLog {
        id: RuleUsageLogId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        rule_id: model.rule_id.map(PostingRuleId::from_uuid),
        rule_code: model.rule_code,
        rule_version: model.rule_version,
        rule_snapshot: model.rule_snapshot,
        journal_entry_id: model.journal_entry_id.map(JournalEntryId::from_uuid),
        source_type: model.source_type,
        source_id: model.source_id,
        trigger_event: model.trigger_event,
        outcome: model.outcome.into(),
        error_message: model.error_message,
        created_at: model.created_at.to_utc(),
    }
}
