//! Results returned by the posting engine.

use rust_decimal::Decimal;
use serde::Serialize;

use ledgerflow_shared::types::{AccountId, CompanyId};

use crate::audit::UsageOutcome;
use crate::ledger::{JournalEntry, PeriodKey};

/// Result of processing a posting event.
#[derive(Debug, Clone, Serialize)]
pub struct EventResult {
    /// The entry for the event's source document.
    pub entry: JournalEntry,
    /// False when an entry already existed for the source document.
    pub created: bool,
    /// How the rule was chosen; `None` for an existing entry.
    pub outcome: Option<UsageOutcome>,
    /// Code of the rule applied.
    pub rule_code: Option<String>,
    /// Version of the rule applied.
    pub rule_version: Option<i32>,
}

impl EventResult {
    /// Wraps an entry that already existed for the event.
    #[must_use]
    pub fn existing(entry: JournalEntry) -> Self {
        Self {
            entry,
            created: false,
            outcome: None,
            rule_code: None,
            rule_version: None,
        }
    }
}

/// Result of creating an entry from lines.
#[derive(Debug, Clone, Serialize)]
pub struct CreateResult {
    /// The new or existing entry.
    pub entry: JournalEntry,
    /// False when an entry already existed for the source document.
    pub created: bool,
}

/// Result of reversing an entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReversalResult {
    /// The original entry, now reversed.
    pub original: JournalEntry,
    /// The posted reversing entry.
    pub reversal: JournalEntry,
}

/// A stored balance that disagreed with the figure recomputed from posted lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDrift {
    /// The account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Period row that drifted; `None` for the running balance.
    pub period: Option<PeriodKey>,
    /// Stored value (closing balance for period rows).
    pub stored: Decimal,
    /// Recomputed value.
    pub recomputed: Decimal,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Company reconciled.
    pub company_id: CompanyId,
    /// Accounts checked.
    pub accounts_checked: usize,
    /// Period rows recomputed.
    pub periods_checked: usize,
    /// Every drift found and repaired.
    pub drifts: Vec<BalanceDrift>,
}

impl ReconciliationReport {
    /// Returns true if nothing had drifted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}
