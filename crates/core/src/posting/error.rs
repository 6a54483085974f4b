//! Posting rule error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while storing, matching or expanding posting rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// No active, effective rule applies to the event.
    #[error("No posting rule matched {source_type}/{trigger_event}")]
    NoRuleMatched {
        /// Event source type.
        source_type: String,
        /// Event trigger.
        trigger_event: String,
    },

    /// A non-skippable amount field is absent or not numeric.
    #[error("Amount field {field:?} on template line {line} is missing or not numeric")]
    MissingAmountField {
        /// Attribute path.
        field: String,
        /// 1-based template line.
        line: usize,
    },

    /// A resolved amount is negative.
    #[error("Amount field {field:?} resolved to negative amount {amount}")]
    NegativeAmount {
        /// Attribute path.
        field: String,
        /// Resolved amount.
        amount: Decimal,
    },

    /// A placeholder has no account code in the event attributes.
    #[error("Account placeholder {0:?} could not be resolved")]
    UnresolvedAccountReference(String),

    /// Expanded lines do not balance, or no line survived expansion.
    #[error("Template expansion is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedTemplate {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A fallback rule posts somewhere other than a suspense account.
    #[error("Fallback rule line {line} posts to {code:?}, which is not a suspense account")]
    FallbackNotSuspense {
        /// Offending account code.
        code: String,
        /// 1-based template line.
        line: usize,
    },

    /// Rule definition is malformed.
    #[error("Invalid posting rule: {0}")]
    InvalidRule(String),

    /// Rule code and version already exist.
    #[error("Posting rule {code} version {version} already exists")]
    DuplicateRule {
        /// Rule code.
        code: String,
        /// Rule version.
        version: i32,
    },

    /// Rule not found.
    #[error("Posting rule not found: {0}")]
    RuleNotFound(String),
}

impl RuleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRuleMatched { .. } => "NO_RULE_MATCHED",
            Self::MissingAmountField { .. } => "MISSING_AMOUNT_FIELD",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::UnresolvedAccountReference(_) => "UNRESOLVED_ACCOUNT_REFERENCE",
            Self::UnbalancedTemplate { .. } => "UNBALANCED_TEMPLATE",
            Self::FallbackNotSuspense { .. } => "FALLBACK_NOT_SUSPENSE",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::DuplicateRule { .. } => "DUPLICATE_RULE",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidRule(_) => 400,
            Self::RuleNotFound(_) => 404,
            Self::DuplicateRule { .. } => 409,
            Self::NoRuleMatched { .. }
            | Self::MissingAmountField { .. }
            | Self::NegativeAmount { .. }
            | Self::UnresolvedAccountReference(_)
            | Self::UnbalancedTemplate { .. }
            | Self::FallbackNotSuspense { .. } => 422,
        }
    }

    /// Returns true if fixing this needs a rule or mapping change.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoRuleMatched { .. }
                | Self::MissingAmountField { .. }
                | Self::UnresolvedAccountReference(_)
                | Self::UnbalancedTemplate { .. }
                | Self::FallbackNotSuspense { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rule_matched() {
        let err = RuleError::NoRuleMatched {
            source_type: "invoice".to_string(),
            trigger_event: "on_finalize".to_string(),
        };
        assert_eq!(err.error_code(), "NO_RULE_MATCHED");
        assert_eq!(err.http_status_code(), 422);
        assert!(err.is_configuration());
        assert!(err.to_string().contains("invoice/on_finalize"));
    }

    #[test]
    fn test_negative_amount_is_input_error() {
        let err = RuleError::NegativeAmount {
            field: "subtotal".to_string(),
            amount: Decimal::NEGATIVE_ONE,
        };
        assert!(!err.is_configuration());
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_duplicate_rule() {
        let err = RuleError::DuplicateRule {
            code: "INV-B2B".to_string(),
            version: 2,
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "DUPLICATE_RULE");
    }
}
