//! HTTP API layer with Axum routes over the posting engine.
//!
//! This crate provides:
//! - REST API routes for companies, accounts, rules, events and journal entries
//! - Report and reconciliation endpoints
//! - Mapping of engine errors to JSON error responses

pub mod error;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ledgerflow_core::engine::{LedgerStore, PostingEngine};
use ledgerflow_db::PgLedgerStore;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S> {
    /// The posting engine all routes delegate to.
    pub engine: Arc<PostingEngine<S>>,
}

/// State backed by PostgreSQL, as used by the server binary.
pub type PgAppState = AppState<PgLedgerStore>;

impl<S> AppState<S> {
    /// Wraps an engine for sharing across handlers.
    pub fn new(engine: PostingEngine<S>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
