//! Ledger error types for validation and state errors.
//!
//! This module defines the errors raised while building, validating and
//! numbering journal entries.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least one line.
    #[error("Journal entry must have at least one line")]
    NoLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amount cannot be zero.
    #[error("Line {line} amount cannot be zero")]
    ZeroAmount {
        /// 1-based line number.
        line: usize,
    },

    /// Line amount cannot be negative.
    #[error("Line {line} amount cannot be negative")]
    NegativeAmount {
        /// 1-based line number.
        line: usize,
    },

    /// Line must carry exactly one of debit or credit.
    #[error("Line {line} must carry either a debit or a credit, not both")]
    InvalidEntryType {
        /// 1-based line number.
        line: usize,
    },

    /// Source type and id are required for idempotency.
    #[error("Source type and source id are required")]
    MissingSourceKey,

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive")]
    InvalidExchangeRate,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    // ========== Calendar Errors ==========
    /// Fiscal year start month is outside 1-12.
    #[error("Invalid fiscal year start month: {0}")]
    InvalidFiscalStartMonth(u32),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::InvalidEntryType { .. } => "INVALID_ENTRY_TYPE",
            Self::MissingSourceKey => "MISSING_SOURCE_KEY",
            Self::InvalidExchangeRate => "INVALID_EXCHANGE_RATE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidFiscalStartMonth(_) => "INVALID_FISCAL_START_MONTH",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NoLines
            | Self::UnbalancedEntry { .. }
            | Self::ZeroAmount { .. }
            | Self::NegativeAmount { .. }
            | Self::InvalidEntryType { .. }
            | Self::MissingSourceKey
            | Self::InvalidExchangeRate
            | Self::AccountInactive(_)
            | Self::InvalidFiscalStartMonth(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) => 404,
        }
    }

    /// Returns true if the error points at missing or inactive configuration
    /// (accounts) rather than bad input.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_) | Self::AccountInactive(_) | Self::InvalidFiscalStartMonth(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::NoLines.error_code(), "NO_LINES");
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(LedgerError::ZeroAmount { line: 1 }.error_code(), "ZERO_AMOUNT");
        assert_eq!(
            LedgerError::NegativeAmount { line: 2 }.error_code(),
            "NEGATIVE_AMOUNT"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::NoLines.http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound("1000".into()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::AccountInactive("1000".into()).http_status_code(),
            400
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert!(LedgerError::AccountNotFound("1000".into()).is_configuration());
        assert!(LedgerError::AccountInactive("1000".into()).is_configuration());
        assert!(!LedgerError::NoLines.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(5000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 100.00, Credit: 50.00"
        );
    }
}
