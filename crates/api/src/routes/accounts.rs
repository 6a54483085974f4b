//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use ledgerflow_core::coa::NewAccount;
use ledgerflow_core::engine::LedgerStore;
use ledgerflow_shared::types::{AccountId, CompanyId};

use crate::{ApiError, AppState};

/// Creates the account routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/accounts",
            get(list_accounts::<S>).post(create_account::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/suspense",
            post(ensure_suspense::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/by-code/{code}",
            get(get_account_by_code::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}",
            get(get_account::<S>).patch(rename_account::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}/deactivate",
            post(deactivate_account::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}/children",
            get(list_children::<S>),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}/ledger",
            get(get_account_ledger::<S>),
        )
}

/// Request body for renaming an account.
#[derive(Debug, Deserialize)]
pub struct RenameAccountRequest {
    /// New display name.
    pub name: String,
}

/// Query parameters for listing child accounts.
#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    /// Include every descendant rather than direct children only.
    #[serde(default)]
    pub recursive: bool,
}

/// Query parameters for an account ledger.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Start date filter (inclusive, YYYY-MM-DD format).
    pub from: Option<NaiveDate>,
    /// End date filter (inclusive, YYYY-MM-DD format). Defaults to today.
    pub to: Option<NaiveDate>,
}

/// GET `/companies/{company_id}/accounts` - List accounts with balances.
async fn list_accounts<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.engine.accounts(company_id).await?;
    Ok(Json(accounts))
}

/// POST `/companies/{company_id}/accounts` - Create an account.
async fn create_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Json(payload): Json<NewAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.engine.create_account(company_id, payload).await?;
    info!(
        company_id = %company_id,
        account_id = %account.id,
        code = %account.code,
        "Account created"
    );
    Ok((StatusCode::CREATED, Json(account)))
}

/// POST `/companies/{company_id}/accounts/suspense` - Create any missing suspense accounts.
async fn ensure_suspense<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.engine.ensure_suspense_accounts(company_id).await?;
    Ok(Json(created))
}

/// GET `/companies/{company_id}/accounts/by-code/{code}` - Look an account up by code.
async fn get_account_by_code<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, code)): Path<(CompanyId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.engine.account_by_code(company_id, &code).await?;
    Ok(Json(account))
}

/// GET `/companies/{company_id}/accounts/{account_id}` - Fetch an account.
async fn get_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, account_id)): Path<(CompanyId, AccountId)>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.engine.account(company_id, account_id).await?;
    Ok(Json(account))
}

/// PATCH `/companies/{company_id}/accounts/{account_id}` - Rename an account.
async fn rename_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, account_id)): Path<(CompanyId, AccountId)>,
    Json(payload): Json<RenameAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .engine
        .rename_account(company_id, account_id, &payload.name)
        .await?;
    Ok(Json(account))
}

/// POST `/companies/{company_id}/accounts/{account_id}/deactivate` - Stop postings to an account.
async fn deactivate_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, account_id)): Path<(CompanyId, AccountId)>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.engine.deactivate_account(company_id, account_id).await?;
    info!(company_id = %company_id, account_id = %account_id, "Account deactivated");
    Ok(Json(account))
}

/// GET `/companies/{company_id}/accounts/{account_id}/children` - List sub-accounts.
async fn list_children<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, account_id)): Path<(CompanyId, AccountId)>,
    Query(query): Query<ChildrenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = if query.recursive {
        state.engine.descendants(company_id, account_id).await?
    } else {
        state.engine.children(company_id, account_id).await?
    };
    Ok(Json(accounts))
}

/// GET `/companies/{company_id}/accounts/{account_id}/ledger` - Posted lines with running balance.
async fn get_account_ledger<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, account_id)): Path<(CompanyId, AccountId)>,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let report = state
        .engine
        .account_ledger(company_id, account_id, query.from, to)
        .await?;
    Ok(Json(report))
}
