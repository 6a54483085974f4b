//! Posting rule routes.
//!
//! Rules are never edited in place. A change is a new version under the same
//! code, which closes the effective window of the one it replaces.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use ledgerflow_core::engine::LedgerStore;
use ledgerflow_core::posting::NewPostingRule;
use ledgerflow_shared::types::{CompanyId, PostingRuleId};

use crate::{ApiError, AppState};

/// Creates the posting rule routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/posting-rules",
            get(list_rules::<S>).post(create_rule::<S>),
        )
        .route(
            "/companies/{company_id}/posting-rules/{rule}/versions",
            post(create_version::<S>),
        )
        .route(
            "/companies/{company_id}/posting-rules/{rule}/deactivate",
            post(deactivate_rule::<S>),
        )
}

/// Query parameters for listing rules.
#[derive(Debug, Deserialize)]
pub struct ListRulesQuery {
    /// Only rules for this source type.
    pub source_type: Option<String>,
}

/// GET `/companies/{company_id}/posting-rules` - List every rule version.
async fn list_rules<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<ListRulesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = state
        .engine
        .list_rules(company_id, query.source_type.as_deref())
        .await?;
    Ok(Json(rules))
}

/// POST `/companies/{company_id}/posting-rules` - Create the first version of a rule.
async fn create_rule<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Json(payload): Json<NewPostingRule>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.engine.create_rule(company_id, payload).await?;
    info!(
        company_id = %company_id,
        rule_id = %rule.id,
        code = %rule.code,
        "Posting rule created"
    );
    Ok((StatusCode::CREATED, Json(rule)))
}

/// POST `/companies/{company_id}/posting-rules/{code}/versions` - Supersede a rule.
async fn create_version<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, code)): Path<(CompanyId, String)>,
    Json(payload): Json<NewPostingRule>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state
        .engine
        .create_rule_version(company_id, &code, payload)
        .await?;
    info!(
        company_id = %company_id,
        code = %rule.code,
        version = rule.version,
        "Posting rule version created"
    );
    Ok((StatusCode::CREATED, Json(rule)))
}

/// POST `/companies/{company_id}/posting-rules/{rule_id}/deactivate` - Retire a rule version.
async fn deactivate_rule<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, rule_id)): Path<(CompanyId, PostingRuleId)>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.engine.deactivate_rule(company_id, rule_id).await?;
    Ok(Json(rule))
}
