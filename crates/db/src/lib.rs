//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger tables
//! - Repositories translating rows into `ledgerflow-core` types
//! - `PgLedgerStore`, the PostgreSQL `LedgerStore`
//! - Database migrations

pub mod entities;
mod error;
pub mod migration;
pub mod repositories;
pub mod store;

pub use repositories::{
    AccountRepository, CompanyRepository, JournalRepository, PeriodBalanceRepository,
    RuleRepository, UsageLogRepository,
};
pub use store::{PgLedgerStore, PgLedgerTx};

use ledgerflow_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a connection pool sized by the database configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
