//! Journal entry routes: manual entries, listing and the lifecycle actions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use ledgerflow_core::engine::{EntryFilter, LedgerStore};
use ledgerflow_core::ledger::{CreateEntryInput, PostingLine};
use ledgerflow_core::workflow::JournalStatus;
use ledgerflow_shared::types::{CompanyId, CurrencyCode, JournalEntryId, PageRequest, PageResponse};

use crate::{ApiError, AppState};

/// Creates the journal entry routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/journal-entries",
            get(list_entries::<S>).post(create_entry::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}",
            get(get_entry::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}/lines",
            put(update_lines::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}/submit",
            post(submit_entry::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}/post",
            post(post_entry::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}/cancel",
            post(cancel_entry::<S>),
        )
        .route(
            "/companies/{company_id}/journal-entries/{entry_id}/reverse",
            post(reverse_entry::<S>),
        )
}

/// Query parameters for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Filter by status.
    pub status: Option<JournalStatus>,
    /// Filter by source type.
    pub source_type: Option<String>,
    /// Only entries posted to suspense (or only those that were not).
    pub needs_reclassification: Option<bool>,
    /// Start date filter (inclusive).
    pub from: Option<NaiveDate>,
    /// End date filter (inclusive).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 200).
    pub per_page: Option<u32>,
}

/// Request body for a manual entry.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Source document type.
    pub source_type: String,
    /// Source document id.
    pub source_id: String,
    /// Human-facing source document number.
    pub source_number: Option<String>,
    /// Event that produced the entry.
    pub trigger_event: Option<String>,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narration.
    pub narration: Option<String>,
    /// Source currency.
    pub currency: Option<CurrencyCode>,
    /// Exchange rate to the base currency.
    pub exchange_rate: Option<Decimal>,
    /// Lines to post.
    pub lines: Vec<PostingLine>,
    /// Post immediately instead of leaving a draft.
    #[serde(default)]
    pub auto_post: bool,
}

impl CreateEntryRequest {
    fn into_input(self, company_id: CompanyId) -> CreateEntryInput {
        CreateEntryInput {
            company_id,
            source_type: self.source_type,
            source_id: self.source_id,
            source_number: self.source_number,
            trigger_event: self.trigger_event,
            entry_date: self.entry_date,
            narration: self.narration,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
            lines: self.lines,
            auto_post: self.auto_post,
            rule_id: None,
            needs_reclassification: false,
        }
    }
}

/// Request body for replacing draft lines.
#[derive(Debug, Deserialize)]
pub struct UpdateLinesRequest {
    /// Replacement lines.
    pub lines: Vec<PostingLine>,
}

/// Request body for cancelling an entry.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// Why the entry is cancelled.
    pub reason: String,
}

/// Request body for reversing an entry.
#[derive(Debug, Deserialize)]
pub struct ReverseRequest {
    /// Why the entry is reversed.
    pub reason: String,
    /// Date of the reversing entry; the original's date when absent.
    pub reversal_date: Option<NaiveDate>,
}

/// GET `/companies/{company_id}/journal-entries` - Paginated entry list.
async fn list_entries<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page).max(1),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let mut filter = EntryFilter {
        status: query.status,
        source_type: query.source_type,
        needs_reclassification: query.needs_reclassification,
        from: query.from,
        to: query.to,
        ..EntryFilter::default()
    };
    let total = state.engine.count_entries(company_id, &filter).await?;

    filter.limit = page.limit();
    filter.offset = page.offset();
    let entries = state.engine.entries(company_id, &filter).await?;

    let per_page = u32::try_from(page.limit()).unwrap_or(page.per_page);
    Ok(Json(PageResponse::new(entries, page.page, per_page, total)))
}

/// POST `/companies/{company_id}/journal-entries` - Create a manual entry.
async fn create_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .engine
        .create_from_lines(payload.into_input(company_id))
        .await?;

    let status = if result.created {
        info!(
            company_id = %company_id,
            entry_id = %result.entry.id,
            journal_number = %result.entry.journal_number,
            "Journal entry created"
        );
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

/// GET `/companies/{company_id}/journal-entries/{entry_id}` - Fetch an entry with its lines.
async fn get_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.engine.entry(company_id, entry_id).await?;
    Ok(Json(entry))
}

/// PUT `/companies/{company_id}/journal-entries/{entry_id}/lines` - Replace draft lines.
async fn update_lines<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
    Json(payload): Json<UpdateLinesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .engine
        .update_lines(company_id, entry_id, payload.lines)
        .await?;
    Ok(Json(entry))
}

/// POST `/companies/{company_id}/journal-entries/{entry_id}/submit` - Send a draft for approval.
async fn submit_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.engine.submit(company_id, entry_id).await?;
    Ok(Json(entry))
}

/// POST `/companies/{company_id}/journal-entries/{entry_id}/post` - Post and update balances.
async fn post_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.engine.post(company_id, entry_id).await?;
    info!(
        company_id = %company_id,
        entry_id = %entry_id,
        journal_number = %entry.journal_number,
        "Journal entry posted"
    );
    Ok(Json(entry))
}

/// POST `/companies/{company_id}/journal-entries/{entry_id}/cancel` - Cancel an unposted entry.
async fn cancel_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
    Json(payload): Json<CancelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .engine
        .cancel(company_id, entry_id, payload.reason)
        .await?;
    Ok(Json(entry))
}

/// POST `/companies/{company_id}/journal-entries/{entry_id}/reverse` - Post a reversing entry.
async fn reverse_entry<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path((company_id, entry_id)): Path<(CompanyId, JournalEntryId)>,
    Json(payload): Json<ReverseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .engine
        .reverse(company_id, entry_id, payload.reason, payload.reversal_date)
        .await?;
    info!(
        company_id = %company_id,
        entry_id = %entry_id,
        reversal_id = %result.reversal.id,
        "Journal entry reversed"
    );
    Ok((StatusCode::CREATED, Json(result)))
}
