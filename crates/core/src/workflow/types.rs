//! Workflow domain types for journal entry lifecycle management.
//!
//! This module defines the core types used for managing journal entry
//! status transitions and workflow actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Journal entry status.
///
/// The valid transitions are:
/// - Draft → PendingApproval (submit)
/// - Draft | PendingApproval → Posted (post)
/// - Draft | PendingApproval → Cancelled (cancel)
/// - Posted → Reversed (reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    /// Entry is being drafted and its lines can be replaced.
    Draft,
    /// Entry has been submitted and waits to be posted.
    PendingApproval,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry was posted and later reversed (terminal).
    Reversed,
    /// Entry was abandoned before posting (terminal).
    Cancelled,
}

impl JournalStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Posted,
        Self::Reversed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "posted" => Some(Self::Posted),
            "reversed" => Some(Self::Reversed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the entry's lines can still be replaced.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry has hit the ledger and is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reversed | Self::Cancelled)
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft entry.
    Submit {
        /// The new status after submission.
        new_status: JournalStatus,
    },
    /// Post an entry to the ledger.
    Post {
        /// The new status after posting.
        new_status: JournalStatus,
        /// When the entry was posted.
        posted_at: DateTime<Utc>,
    },
    /// Cancel an unposted entry.
    Cancel {
        /// The new status after cancelling.
        new_status: JournalStatus,
        /// Why the entry was cancelled.
        reason: String,
    },
    /// Reverse a posted entry.
    Reverse {
        /// The new status of the original entry.
        new_status: JournalStatus,
        /// Why the entry was reversed.
        reason: String,
        /// When the reversal was recorded.
        reversed_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> JournalStatus {
        match self {
            Self::Submit { new_status }
            | Self::Post { new_status, .. }
            | Self::Cancel { new_status, .. }
            | Self::Reverse { new_status, .. } => *new_status,
        }
    }
}
