//! Property-based tests for WorkflowService.

use proptest::prelude::*;

use ledgerflow_shared::types::JournalEntryId;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{JournalStatus, WorkflowAction};

/// Strategy for generating random JournalStatus values.
fn arb_status() -> impl Strategy<Value = JournalStatus> {
    prop_oneof![
        Just(JournalStatus::Draft),
        Just(JournalStatus::PendingApproval),
        Just(JournalStatus::Posted),
        Just(JournalStatus::Reversed),
        Just(JournalStatus::Cancelled),
    ]
}

/// Strategy for generating non-empty reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,40}"
}

/// Strategy for generating blank reasons.
fn arb_blank_reason() -> impl Strategy<Value = String> {
    " {0,10}"
}

fn attempt(
    status: JournalStatus,
    target: JournalStatus,
    reason: String,
) -> Result<WorkflowAction, WorkflowError> {
    match target {
        JournalStatus::PendingApproval => WorkflowService::submit(status),
        JournalStatus::Posted => WorkflowService::post(status),
        JournalStatus::Cancelled => WorkflowService::cancel(status, reason),
        JournalStatus::Reversed => {
            WorkflowService::reverse(JournalEntryId::new(), status, None, reason)
        }
        JournalStatus::Draft => WorkflowService::ensure_editable(status).map(|()| {
            WorkflowAction::Submit {
                new_status: JournalStatus::Draft,
            }
        }),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every action succeeds exactly when the transition table allows it,
    /// and the action lands on the requested status.
    #[test]
    fn prop_actions_follow_transition_table(
        from in arb_status(),
        to in arb_status(),
        reason in arb_reason(),
    ) {
        prop_assume!(to != JournalStatus::Draft);
        let result = attempt(from, to, reason);
        let allowed = WorkflowService::is_valid_transition(from, to);
        prop_assert_eq!(result.is_ok(), allowed, "from {} to {}", from, to);
        if let Ok(action) = result {
            prop_assert_eq!(action.new_status(), to);
        }
    }

    /// Terminal statuses accept no transition at all.
    #[test]
    fn prop_terminal_states_are_final(
        from in prop_oneof![Just(JournalStatus::Reversed), Just(JournalStatus::Cancelled)],
        to in arb_status(),
    ) {
        prop_assert!(!WorkflowService::is_valid_transition(from, to));
    }

    /// Blank reasons are rejected before the status is considered.
    #[test]
    fn prop_blank_reason_rejected(status in arb_status(), reason in arb_blank_reason()) {
        prop_assert!(matches!(
            WorkflowService::cancel(status, reason.clone()),
            Err(WorkflowError::ReasonRequired)
        ));
        prop_assert!(matches!(
            WorkflowService::reverse(JournalEntryId::new(), status, None, reason),
            Err(WorkflowError::ReasonRequired)
        ));
    }

    /// An entry that already has a reversal can never be reversed again.
    #[test]
    fn prop_second_reversal_rejected(status in arb_status(), reason in arb_reason()) {
        let result = WorkflowService::reverse(
            JournalEntryId::new(),
            status,
            Some(JournalEntryId::new()),
            reason,
        );
        let already_reversed = matches!(result, Err(WorkflowError::AlreadyReversed { .. }));
        prop_assert!(already_reversed);
    }

    /// Only drafts are editable; posted and reversed entries report immutability.
    #[test]
    fn prop_edit_guard(status in arb_status()) {
        let result = WorkflowService::ensure_editable(status);
        match status {
            JournalStatus::Draft => prop_assert!(result.is_ok()),
            JournalStatus::Posted | JournalStatus::Reversed => {
                let immutable = matches!(result, Err(WorkflowError::ImmutableEntry { .. }));
                prop_assert!(immutable);
            }
            JournalStatus::PendingApproval | JournalStatus::Cancelled => {
                let invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
                prop_assert!(invalid);
            }
        }
    }
}
