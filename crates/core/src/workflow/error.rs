//! Workflow error types for journal entry lifecycle management.

use thiserror::Error;

use ledgerflow_shared::types::JournalEntryId;

use crate::workflow::types::JournalStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: JournalStatus,
        /// The attempted target status.
        to: JournalStatus,
    },

    /// Attempted to modify a posted or reversed entry.
    #[error("Cannot modify {status} journal entry")]
    ImmutableEntry {
        /// The current status.
        status: JournalStatus,
    },

    /// The entry already has a reversal.
    #[error("Journal entry {entry_id} is already reversed")]
    AlreadyReversed {
        /// The original entry.
        entry_id: JournalEntryId,
        /// The existing reversal, when known.
        reversed_by: Option<JournalEntryId>,
    },

    /// Cancel and reverse need a reason.
    #[error("Reason is required")]
    ReasonRequired,

    /// Journal entry not found.
    #[error("Journal entry {0} not found")]
    EntryNotFound(JournalEntryId),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ReasonRequired => 400,
            Self::EntryNotFound(_) => 404,
            Self::InvalidTransition { .. }
            | Self::ImmutableEntry { .. }
            | Self::AlreadyReversed { .. } => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ImmutableEntry { .. } => "IMMUTABLE_ENTRY",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::EntryNotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
        }
    }
}
