//! Ledgerflow API Server
//!
//! Main entry point for the Ledgerflow posting service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerflow_api::{AppState, create_router};
use ledgerflow_core::engine::{EngineConfig, PostingEngine};
use ledgerflow_db::{PgLedgerStore, connect_with};
use ledgerflow_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let engine_config = EngineConfig::from(&config.ledger);
    info!(
        prefix = %engine_config.journal_number_prefix,
        timeout_secs = engine_config.transaction_timeout.as_secs(),
        "Posting engine configured"
    );
    let store = PgLedgerStore::new(db, engine_config.transaction_timeout);
    let state = AppState::new(PostingEngine::new(store, engine_config));

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
