//! Rule usage log: which rule produced which entry, and what went wrong.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use ledgerflow_shared::types::{CompanyId, JournalEntryId, PostingRuleId, RuleUsageLogId};

use crate::posting::{PostingEvent, PostingRule};

/// Outcome of processing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageOutcome {
    /// A rule matched and the entry was created.
    Matched,
    /// The suspense fallback produced the entry.
    FallbackUsed,
    /// No rule applied to the event.
    NoRuleMatched,
    /// Processing failed after a rule was chosen.
    Failed,
}

impl UsageOutcome {
    /// Returns the string representation of the outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::FallbackUsed => "fallback_used",
            Self::NoRuleMatched => "no_rule_matched",
            Self::Failed => "failed",
        }
    }

    /// Parses an outcome from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "matched" => Some(Self::Matched),
            "fallback_used" => Some(Self::FallbackUsed),
            "no_rule_matched" => Some(Self::NoRuleMatched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for UsageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one rule application attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUsageLog {
    /// Log id.
    pub id: RuleUsageLogId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Rule version applied, if any.
    pub rule_id: Option<PostingRuleId>,
    /// Rule code, if any.
    pub rule_code: Option<String>,
    /// Rule version number, if any.
    pub rule_version: Option<i32>,
    /// Rule as it was when applied.
    pub rule_snapshot: Option<Value>,
    /// Entry produced, if any.
    pub journal_entry_id: Option<JournalEntryId>,
    /// Event source type.
    pub source_type: String,
    /// Event source id.
    pub source_id: String,
    /// Event trigger.
    pub trigger_event: String,
    /// Outcome.
    pub outcome: UsageOutcome,
    /// Error text for failures.
    pub error_message: Option<String>,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
}

impl RuleUsageLog {
    /// Starts a log record for an event with no rule attached.
    #[must_use]
    pub fn for_event(event: &PostingEvent, outcome: UsageOutcome) -> Self {
        Self {
            id: RuleUsageLogId::new(),
            company_id: event.company_id,
            rule_id: None,
            rule_code: None,
            rule_version: None,
            rule_snapshot: None,
            journal_entry_id: None,
            source_type: event.source_type.clone(),
            source_id: event.source_id.clone(),
            trigger_event: event.trigger_event.clone(),
            outcome,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches the applied rule and its snapshot.
    #[must_use]
    pub fn with_rule(mut self, rule: &PostingRule) -> Self {
        self.rule_id = Some(rule.id);
        self.rule_code = Some(rule.code.clone());
        self.rule_version = Some(rule.version);
        self.rule_snapshot = Some(rule.snapshot());
        self
    }

    /// Attaches the produced entry.
    #[must_use]
    pub fn with_entry(mut self, entry_id: JournalEntryId) -> Self {
        self.journal_entry_id = Some(entry_id);
        self
    }

    /// Attaches an error message.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Filter for listing usage logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLogFilter {
    /// Only this outcome.
    #[serde(default)]
    pub outcome: Option<UsageOutcome>,
    /// Only this source type.
    #[serde(default)]
    pub source_type: Option<String>,
    /// Only this rule code.
    #[serde(default)]
    pub rule_code: Option<String>,
}

impl UsageLogFilter {
    /// Returns true if the log passes the filter.
    #[must_use]
    pub fn accepts(&self, log: &RuleUsageLog) -> bool {
        self.outcome.is_none_or(|o| o == log.outcome)
            && self
                .source_type
                .as_deref()
                .is_none_or(|s| s == log.source_type)
            && self
                .rule_code
                .as_deref()
                .is_none_or(|c| log.rule_code.as_deref() == Some(c))
    }
}
