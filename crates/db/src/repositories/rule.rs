//! Posting rule repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use ledgerflow_core::engine::StoreError;
use ledgerflow_core::posting::PostingRule;
use ledgerflow_shared::types::{CompanyId, PostingRuleId};

use crate::entities::posting_rules;
use crate::error::{corrupt, store_error, unique_violation};

/// Posting rule repository.
#[derive(Debug, Clone, Copy)]
pub struct RuleRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> RuleRepository<'a, C> {
    /// Creates a new rule repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Lists rule versions of a company, optionally for one source type.
    pub async fn list(
        &self,
        company_id: CompanyId,
        source_type: Option<&str>,
    ) -> Result<Vec<PostingRule>, StoreError> {
        let mut query = posting_rules::Entity::find()
            .filter(posting_rules::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(source_type) = source_type {
            query = query.filter(posting_rules::Column::SourceType.eq(source_type));
        }
        query
            .order_by_asc(posting_rules::Column::Code)
            .order_by_asc(posting_rules::Column::Version)
            .all(self.conn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Inserts a rule version.
    pub async fn insert(&self, rule: &PostingRule) -> Result<(), StoreError> {
        let condition =
            serde_json::to_value(&rule.condition).map_err(|e| corrupt("rule condition", e))?;
        let template =
            serde_json::to_value(&rule.template).map_err(|e| corrupt("rule template", e))?;

        let model = posting_rules::ActiveModel {
            id: Set(rule.id.into_inner()),
            company_id: Set(rule.company_id.into_inner()),
            code: Set(rule.code.clone()),
            version: Set(rule.version),
            source_type: Set(rule.source_type.clone()),
            trigger_event: Set(rule.trigger_event.clone()),
            description: Set(rule.description.clone()),
            condition: Set(condition),
            template: Set(template),
            priority: Set(rule.priority),
            effective_from: Set(rule.effective_from),
            effective_to: Set(rule.effective_to),
            is_active: Set(rule.is_active),
            is_fallback: Set(rule.is_fallback),
            created_at: Set(rule.created_at.into()),
        };
        model.insert(self.conn).await.map_err(|e| {
            if unique_violation(&e).is_some() {
                StoreError::Duplicate {
                    entity: "posting rule",
                    key: format!("{} v{}", rule.code, rule.version),
                }
            } else {
                store_error(e)
            }
        })?;
        Ok(())
    }

    /// Writes the effective window end and active flag of a rule version.
    ///
    /// Nothing else about a stored version ever changes.
    pub async fn update_window(&self, rule: &PostingRule) -> Result<(), StoreError> {
        let model = posting_rules::ActiveModel {
            id: Set(rule.id.into_inner()),
            effective_to: Set(rule.effective_to),
            is_active: Set(rule.is_active),
            ..Default::default()
        };
        model.update(self.conn).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => StoreError::not_found("posting rule", rule.id),
            other => store_error(other),
        })?;
        Ok(())
    }
}

fn to_domain(model: posting_rules::Model) -> Result<PostingRule, StoreError> {
    Ok(PostingRule {
        id: PostingRuleId::from_uuid(model.id),
        code: model.code,
        version: model.version,
        company_id: CompanyId::from_uuid(model.company_id),
        source_type: model.source_type,
        trigger_event: model.trigger_event,
        description: model.description,
        condition: serde_json::from_value(model.condition)
            .map_err(|e| corrupt("rule condition", e))?,
        template: serde_json::from_value(model.template)
            .map_err(|e| corrupt("rule template", e))?,
        priority: model.priority,
        effective_from: model.effective_from,
        effective_to: model.effective_to,
        is_active: model.is_active,
        is_fallback: model.is_fallback,
        created_at: model.created_at.to_utc(),
    })
}
