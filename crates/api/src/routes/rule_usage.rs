//! Rule usage log queries.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use ledgerflow_core::audit::{UsageLogFilter, UsageOutcome};
use ledgerflow_core::engine::LedgerStore;
use ledgerflow_shared::types::CompanyId;
use ledgerflow_shared::types::pagination::MAX_PER_PAGE;

use crate::{ApiError, AppState};

/// Creates the rule usage routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/companies/{company_id}/rule-usage", get(list_usage::<S>))
}

/// Query parameters for the usage log.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Only this outcome.
    pub outcome: Option<UsageOutcome>,
    /// Only this source type.
    pub source_type: Option<String>,
    /// Only this rule code.
    pub rule_code: Option<String>,
    /// Maximum rows (default: 50).
    pub limit: Option<u32>,
}

/// GET `/companies/{company_id}/rule-usage` - Newest usage logs first.
async fn list_usage<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<UsageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_PER_PAGE);
    let filter = UsageLogFilter {
        outcome: query.outcome,
        source_type: query.source_type,
        rule_code: query.rule_code,
    };
    let logs = state
        .engine
        .usage_logs(company_id, &filter, u64::from(limit))
        .await?;
    Ok(Json(logs))
}
