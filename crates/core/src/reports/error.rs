//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

use ledgerflow_shared::types::AccountId;

/// Errors raised while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The account asked for does not belong to the company.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The period ends before it starts.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::InvalidDateRange { .. } => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_is_bad_request() {
        let err = ReportError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert!(err.to_string().contains("2024-06-30"));
    }
}
