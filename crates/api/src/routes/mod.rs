//! API route definitions.

use axum::Router;

use ledgerflow_core::engine::LedgerStore;

use crate::AppState;

pub mod accounts;
pub mod companies;
pub mod events;
pub mod health;
pub mod journal_entries;
pub mod posting_rules;
pub mod reports;
pub mod rule_usage;


/// Creates the API router with all routes.
pub fn api_routes<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(companies::routes())
        .merge(accounts::routes())
        .merge(posting_rules::routes())
        .merge(events::routes())
        .merge(journal_entries::routes())
        .merge(rule_usage::routes())
        .merge(reports::routes())
}
