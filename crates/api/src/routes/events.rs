//! Posting event intake.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use ledgerflow_core::engine::LedgerStore;
use ledgerflow_core::posting::{Attributes, PostingEvent};
use ledgerflow_shared::types::{CompanyId, CurrencyCode};

use crate::{ApiError, AppState};

/// Creates the event routes.
pub fn routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/companies/{company_id}/events", post(process_event::<S>))
}

/// Request body for a posting event.
#[derive(Debug, Deserialize)]
pub struct PostingEventRequest {
    /// Source document type, e.g. `invoice`.
    pub source_type: String,
    /// Source document id.
    pub source_id: String,
    /// Human-facing document number.
    pub source_number: Option<String>,
    /// Lifecycle event, e.g. `on_finalize`.
    pub trigger_event: String,
    /// Facts for rule matching and amount lookup.
    #[serde(default)]
    pub attributes: Attributes,
    /// Accounting date.
    pub event_date: NaiveDate,
    /// Narration for the entry.
    pub narration: Option<String>,
    /// Document currency.
    pub currency: Option<CurrencyCode>,
    /// Rate to the base currency.
    pub exchange_rate: Option<Decimal>,
}

impl PostingEventRequest {
    fn into_event(self, company_id: CompanyId) -> PostingEvent {
        PostingEvent {
            company_id,
            source_type: self.source_type,
            source_id: self.source_id,
            source_number: self.source_number,
            trigger_event: self.trigger_event,
            attributes: self.attributes,
            event_date: self.event_date,
            narration: self.narration,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
        }
    }
}

/// POST `/companies/{company_id}/events` - Turn a business event into a posted entry.
///
/// Replays of an already-posted source document return the existing entry
/// with `200 OK`; new entries return `201 Created`.
async fn process_event<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Json(payload): Json<PostingEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .engine
        .process_event(payload.into_event(company_id))
        .await?;

    let status = if result.created {
        info!(
            company_id = %company_id,
            entry_id = %result.entry.id,
            journal_number = %result.entry.journal_number,
            "Event posted"
        );
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}
