//! Financial report and reconciliation routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use ledgerflow_core::engine::LedgerStore;
use ledgerflow_shared::types::CompanyId;

use crate::{ApiError, AppState};

/// Creates the report routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/reports/trial-balance",
            get(trial_balance::<S>),
        )
        .route(
            "/companies/{company_id}/reports/balance-sheet",
            get(balance_sheet::<S>),
        )
        .route(
            "/companies/{company_id}/reports/income-statement",
            get(income_statement::<S>),
        )
        .route(
            "/companies/{company_id}/period-balances",
            get(period_balances::<S>),
        )
        .route(
            "/companies/{company_id}/reconciliation",
            post(reconcile::<S>),
        )
}

/// Query parameters for point-in-time reports.
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    /// Report date (YYYY-MM-DD). Defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// Query parameters for period reports.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    /// Start date (inclusive).
    pub from: NaiveDate,
    /// End date (inclusive).
    pub to: NaiveDate,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// GET `/companies/{company_id}/reports/trial-balance`
async fn trial_balance<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<AsOfQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(today);
    let report = state.engine.trial_balance(company_id, as_of).await?;
    Ok(Json(report))
}

/// GET `/companies/{company_id}/reports/balance-sheet`
async fn balance_sheet<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<AsOfQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(today);
    let report = state.engine.balance_sheet(company_id, as_of).await?;
    Ok(Json(report))
}

/// GET `/companies/{company_id}/reports/income-statement`
async fn income_statement<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .engine
        .income_statement(company_id, query.from, query.to)
        .await?;
    Ok(Json(report))
}

/// GET `/companies/{company_id}/period-balances`
async fn period_balances<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    let balances = state.engine.period_balances(company_id).await?;
    Ok(Json(balances))
}

/// POST `/companies/{company_id}/reconciliation` - Recompute stored balances from posted lines.
async fn reconcile<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.engine.reconcile(company_id).await?;
    if report.is_clean() {
        info!(
            company_id = %company_id,
            accounts = report.accounts_checked,
            "Balances reconciled"
        );
    } else {
        warn!(
            company_id = %company_id,
            drifts = report.drifts.len(),
            "Balance drift repaired"
        );
    }
    Ok(Json(report))
}
