//! Company onboarding routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::info;

use ledgerflow_core::coa::NewCompany;
use ledgerflow_core::engine::LedgerStore;
use ledgerflow_shared::types::CompanyId;

use crate::{ApiError, AppState};

/// Creates the company routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/companies", post(create_company::<S>))
        .route("/companies/{company_id}", get(get_company::<S>))
}

/// POST `/companies` - Create a company with its suspense accounts.
async fn create_company<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewCompany>,
) -> Result<impl IntoResponse, ApiError> {
    let company = state.engine.create_company(payload).await?;
    info!(company_id = %company.id, name = %company.name, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET `/companies/{company_id}` - Fetch a company.
async fn get_company<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    let company = state.engine.company(company_id).await?;
    Ok(Json(company))
}
