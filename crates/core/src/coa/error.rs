//! Chart of accounts error types.

use thiserror::Error;

use super::types::AccountType;

/// Errors raised by chart of accounts operations.
#[derive(Debug, Error)]
pub enum CoaError {
    /// An account with the same code already exists in the company.
    #[error("Account code {0} already exists")]
    DuplicateCode(String),

    /// Account not found by code or id.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Parent account not found in the same company.
    #[error("Parent account not found: {0}")]
    ParentNotFound(String),

    /// Child and parent accounts must share an account type.
    #[error("Account {code} of type {account_type} cannot sit under a {parent_type} account")]
    ParentTypeMismatch {
        /// Child account code.
        code: String,
        /// Child account type.
        account_type: AccountType,
        /// Parent account type.
        parent_type: AccountType,
    },

    /// Account code is blank or malformed.
    #[error("Invalid account code: {0:?}")]
    InvalidCode(String),

    /// Account name is blank.
    #[error("Account {0} must have a name")]
    InvalidName(String),

    /// Account is inactive and cannot receive postings.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Suspense accounts back the fallback path and stay active.
    #[error("Suspense account {0} cannot be deactivated")]
    SuspenseAccountRequired(String),
}

impl CoaError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentTypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::InvalidCode(_) => "INVALID_ACCOUNT_CODE",
            Self::InvalidName(_) => "INVALID_ACCOUNT_NAME",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::SuspenseAccountRequired(_) => "SUSPENSE_ACCOUNT_REQUIRED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::DuplicateCode(_) => 409,
            Self::NotFound(_) => 404,
            Self::ParentNotFound(_)
            | Self::ParentTypeMismatch { .. }
            | Self::InvalidCode(_)
            | Self::InvalidName(_)
            | Self::AccountInactive(_)
            | Self::SuspenseAccountRequired(_) => 400,
        }
    }
}
