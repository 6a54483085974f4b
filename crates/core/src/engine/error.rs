//! Engine error type.

use thiserror::Error;

use super::store::{ACCOUNT_ENTITY, StoreError};
use crate::coa::CoaError;
use crate::ledger::LedgerError;
use crate::posting::RuleError;
use crate::reports::ReportError;
use crate::workflow::WorkflowError;

/// What a caller should do about a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient failure; the same request may succeed when retried.
    RetrySafe,
    /// A rule or account has to be created or fixed before retrying.
    NeedsConfiguration,
    /// The request itself is invalid for the current state.
    Rejected,
}

impl Disposition {
    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetrySafe => "retry_safe",
            Self::NeedsConfiguration => "needs_configuration",
            Self::Rejected => "rejected",
        }
    }
}

/// Errors returned by the posting engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Chart of accounts error.
    #[error(transparent)]
    Coa(#[from] CoaError),

    /// Posting rule error.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Journal validation error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Lifecycle error.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Report error.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Storage error.
    #[error(transparent)]
    Store(StoreError),

    /// A storage transaction exceeded the configured timeout.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl From<StoreError> for EngineError {
    /// A duplicate account code that slipped past the chart check (a
    /// concurrent create) is the same configuration error the chart reports.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate {
                entity: ACCOUNT_ENTITY,
                key,
            } => Self::Coa(CoaError::DuplicateCode(key)),
            other => Self::Store(other),
        }
    }
}

impl EngineError {
    /// Classifies the error for callers deciding whether to retry.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Timeout(_) => Disposition::RetrySafe,
            Self::Store(err) => match err {
                StoreError::Conflict(_) | StoreError::Timeout(_) | StoreError::Backend(_) => {
                    Disposition::RetrySafe
                }
                StoreError::NotFound { .. }
                | StoreError::DuplicateSource { .. }
                | StoreError::Duplicate { .. } => Disposition::Rejected,
            },
            Self::Coa(
                CoaError::DuplicateCode(_) | CoaError::NotFound(_) | CoaError::AccountInactive(_),
            ) => Disposition::NeedsConfiguration,
            Self::Rule(err) if err.is_configuration() => Disposition::NeedsConfiguration,
            Self::Ledger(err) if err.is_configuration() => Disposition::NeedsConfiguration,
            Self::Coa(_) | Self::Rule(_) | Self::Ledger(_) | Self::Workflow(_) | Self::Report(_) => {
                Disposition::Rejected
            }
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::RetrySafe
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Coa(err) => err.error_code(),
            Self::Rule(err) => err.error_code(),
            Self::Ledger(err) => err.error_code(),
            Self::Workflow(err) => err.error_code(),
            Self::Report(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
            Self::Timeout(_) => "TRANSACTION_TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Coa(err) => err.http_status_code(),
            Self::Rule(err) => err.http_status_code(),
            Self::Ledger(err) => err.http_status_code(),
            Self::Workflow(err) => err.http_status_code(),
            Self::Report(err) => err.http_status_code(),
            Self::Store(err) => err.http_status_code(),
            Self::Timeout(_) => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(EngineError::Store(StoreError::Conflict("deadlock".into())), Disposition::RetrySafe)]
    #[case(EngineError::Store(StoreError::Timeout("lock".into())), Disposition::RetrySafe)]
    #[case(EngineError::Timeout(5), Disposition::RetrySafe)]
    #[case(
        EngineError::Rule(RuleError::NoRuleMatched {
            source_type: "invoice".into(),
            trigger_event: "on_finalize".into(),
        }),
        Disposition::NeedsConfiguration
    )]
    #[case(
        EngineError::Rule(RuleError::UnresolvedAccountReference("bank".into())),
        Disposition::NeedsConfiguration
    )]
    #[case(
        EngineError::Ledger(LedgerError::AccountInactive("4100".into())),
        Disposition::NeedsConfiguration
    )]
    #[case(
        EngineError::Coa(CoaError::DuplicateCode("1110".into())),
        Disposition::NeedsConfiguration
    )]
    #[case(
        EngineError::Ledger(LedgerError::UnbalancedEntry {
            debit: Decimal::ONE,
            credit: Decimal::ZERO,
        }),
        Disposition::Rejected
    )]
    #[case(EngineError::Workflow(WorkflowError::ReasonRequired), Disposition::Rejected)]
    fn test_disposition(#[case] error: EngineError, #[case] expected: Disposition) {
        assert_eq!(error.disposition(), expected);
    }

    #[test]
    fn test_store_duplicate_account_is_duplicate_code() {
        let err = EngineError::from(StoreError::Duplicate {
            entity: ACCOUNT_ENTITY,
            key: "1110".into(),
        });
        assert!(matches!(err, EngineError::Coa(CoaError::DuplicateCode(ref code)) if code == "1110"));
        assert_eq!(err.disposition(), Disposition::NeedsConfiguration);

        let err = EngineError::from(StoreError::Duplicate {
            entity: "company",
            key: "acme".into(),
        });
        assert_eq!(err.disposition(), Disposition::Rejected);
    }

    #[test]
    fn test_codes_delegate_to_source() {
        let err = EngineError::from(WorkflowError::ReasonRequired);
        assert_eq!(err.error_code(), "REASON_REQUIRED");
        assert_eq!(err.http_status_code(), 400);

        let err = EngineError::from(StoreError::Timeout("statement".into()));
        assert_eq!(err.error_code(), "TRANSACTION_TIMEOUT");
        assert_eq!(err.http_status_code(), 503);
        assert!(err.is_retryable());
    }
}
