//! Workflow service for journal entry state transitions.
//!
//! This module implements the state machine that moves journal entries
//! from draft to posted and on to reversed or cancelled.

use chrono::Utc;

use ledgerflow_shared::types::JournalEntryId;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{JournalStatus, WorkflowAction};

/// Stateless service for managing journal entry workflow transitions.
///
/// All methods are associated functions that validate a transition and
/// return the `WorkflowAction` to persist.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Submit)` if the entry is a draft
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn submit(current_status: JournalStatus) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            JournalStatus::Draft => Ok(WorkflowAction::Submit {
                new_status: JournalStatus::PendingApproval,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: JournalStatus::PendingApproval,
            }),
        }
    }

    /// Post an entry to the ledger.
    ///
    /// Drafts may be posted directly; there is no separate approval step.
    pub fn post(current_status: JournalStatus) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            JournalStatus::Draft | JournalStatus::PendingApproval => Ok(WorkflowAction::Post {
                new_status: JournalStatus::Posted,
                posted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: JournalStatus::Posted,
            }),
        }
    }

    /// Cancel an entry that has not been posted.
    ///
    /// # Returns
    /// * `Err(WorkflowError::ReasonRequired)` if reason is blank
    /// * `Err(WorkflowError::InvalidTransition)` if the entry is past pending
    pub fn cancel(
        current_status: JournalStatus,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReasonRequired);
        }

        match current_status {
            JournalStatus::Draft | JournalStatus::PendingApproval => Ok(WorkflowAction::Cancel {
                new_status: JournalStatus::Cancelled,
                reason,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: JournalStatus::Cancelled,
            }),
        }
    }

    /// Reverse a posted entry.
    ///
    /// # Returns
    /// * `Err(WorkflowError::ReasonRequired)` if reason is blank
    /// * `Err(WorkflowError::AlreadyReversed)` if a reversal exists
    /// * `Err(WorkflowError::InvalidTransition)` if the entry is not posted
    pub fn reverse(
        entry_id: JournalEntryId,
        current_status: JournalStatus,
        reversed_by: Option<JournalEntryId>,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReasonRequired);
        }
        if current_status == JournalStatus::Reversed || reversed_by.is_some() {
            return Err(WorkflowError::AlreadyReversed {
                entry_id,
                reversed_by,
            });
        }

        match current_status {
            JournalStatus::Posted => Ok(WorkflowAction::Reverse {
                new_status: JournalStatus::Reversed,
                reason,
                reversed_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: JournalStatus::Reversed,
            }),
        }
    }

    /// Check that an entry's lines may be replaced.
    ///
    /// Posted and reversed entries are immutable; pending and cancelled
    /// entries would have to move back to draft, which is not a transition.
    pub fn ensure_editable(current_status: JournalStatus) -> Result<(), WorkflowError> {
        match current_status {
            JournalStatus::Draft => Ok(()),
            JournalStatus::Posted | JournalStatus::Reversed => Err(WorkflowError::ImmutableEntry {
                status: current_status,
            }),
            JournalStatus::PendingApproval | JournalStatus::Cancelled => {
                Err(WorkflowError::InvalidTransition {
                    from: current_status,
                    to: JournalStatus::Draft,
                })
            }
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: JournalStatus, to: JournalStatus) -> bool {
        matches!(
            (from, to),
            (JournalStatus::Draft, JournalStatus::PendingApproval)
                | (
                    JournalStatus::Draft | JournalStatus::PendingApproval,
                    JournalStatus::Posted | JournalStatus::Cancelled
                )
                | (JournalStatus::Posted, JournalStatus::Reversed)
        )
    }
}
