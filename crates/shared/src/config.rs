//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Calendar month (1-12) in which the fiscal year starts.
    #[serde(default = "default_fiscal_year_start_month")]
    pub fiscal_year_start_month: u32,
    /// Largest debit/credit difference still treated as balanced (exclusive).
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    /// Prefix for journal numbers, e.g. `JV` in `JV/2024-25/00001`.
    #[serde(default = "default_journal_number_prefix")]
    pub journal_number_prefix: String,
    /// Upper bound for a single posting transaction, in seconds.
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_secs: u64,
    /// Attributes holding an event's full amount, tried in order when a
    /// suspense fallback posts an unmatched event.
    #[serde(default = "default_fallback_amount_fields")]
    pub fallback_amount_fields: Vec<String>,
}

fn default_fiscal_year_start_month() -> u32 {
    4 // April
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

fn default_journal_number_prefix() -> String {
    "JV".to_string()
}

fn default_transaction_timeout() -> u64 {
    5
}

fn default_fallback_amount_fields() -> Vec<String> {
    ["total_amount", "grand_total", "amount"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fiscal_year_start_month: default_fiscal_year_start_month(),
            balance_tolerance: default_balance_tolerance(),
            journal_number_prefix: default_journal_number_prefix(),
            transaction_timeout_secs: default_transaction_timeout(),
            fallback_amount_fields: default_fallback_amount_fields(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        // Missing .env is fine; real deployments inject the environment directly.
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
