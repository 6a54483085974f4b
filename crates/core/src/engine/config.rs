//! Engine settings.

use rust_decimal::Decimal;
use std::time::Duration;

use ledgerflow_shared::config::LedgerConfig;

/// Settings the posting engine reads on every operation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Largest debit/credit difference still treated as balanced (exclusive).
    pub balance_tolerance: Decimal,
    /// Journal number prefix.
    pub journal_number_prefix: String,
    /// Fiscal year start month for companies created without one.
    pub default_fiscal_year_start_month: u32,
    /// Upper bound for one storage transaction.
    pub transaction_timeout: Duration,
    /// Attributes read, in order, for the amount a suspense fallback posts.
    pub fallback_amount_fields: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for EngineConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            balance_tolerance: config.balance_tolerance,
            journal_number_prefix: config.journal_number_prefix.clone(),
            default_fiscal_year_start_month: config.fiscal_year_start_month,
            transaction_timeout: Duration::from_secs(config.transaction_timeout_secs),
            fallback_amount_fields: config.fallback_amount_fields.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_follow_ledger_config() {
        let config = EngineConfig::default();
        assert_eq!(config.balance_tolerance, dec!(0.0001));
        assert_eq!(config.journal_number_prefix, "JV");
        assert_eq!(config.default_fiscal_year_start_month, 4);
        assert_eq!(config.transaction_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_amount_fields[0], "total_amount");
    }
}
