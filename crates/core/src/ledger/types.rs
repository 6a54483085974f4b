//! Ledger input types for journal entry creation and validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerflow_shared::types::{CompanyId, CurrencyCode, PostingRuleId};

use super::entry::{EntryType, SubledgerRef};

/// A concrete line to post: account code, side and amount.
///
/// Produced by the template expander or supplied directly for manual entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account code to post to.
    pub account_code: String,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Positive amount.
    pub amount: Decimal,
    /// Optional subledger tag.
    #[serde(default)]
    pub subledger: Option<SubledgerRef>,
    /// Optional line memo.
    #[serde(default)]
    pub memo: Option<String>,
}

impl PostingLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            entry_type: EntryType::Debit,
            amount,
            subledger: None,
            memo: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            entry_type: EntryType::Credit,
            amount,
            subledger: None,
            memo: None,
        }
    }
}

/// Input for creating a journal entry from lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Source document type.
    pub source_type: String,
    /// Source document id.
    pub source_id: String,
    /// Human-facing source document number.
    #[serde(default)]
    pub source_number: Option<String>,
    /// Event that produced the entry.
    #[serde(default)]
    pub trigger_event: Option<String>,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narration.
    #[serde(default)]
    pub narration: Option<String>,
    /// Source currency; defaults to the company's base currency.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    /// Exchange rate to the base currency; defaults to 1.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// Lines to post.
    pub lines: Vec<PostingLine>,
    /// Post in the same transaction as creation.
    #[serde(default)]
    pub auto_post: bool,
    /// Rule version that produced the lines.
    #[serde(skip)]
    pub rule_id: Option<PostingRuleId>,
    /// Set by the suspense fallback.
    #[serde(skip)]
    pub needs_reclassification: bool,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums the debit and credit sides of posting lines.
    #[must_use]
    pub fn of(lines: &[PostingLine]) -> Self {
        lines.iter().fold(
            Self {
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
            },
            |mut acc, line| {
                match line.entry_type {
                    EntryType::Debit => acc.debit += line.amount,
                    EntryType::Credit => acc.credit += line.amount,
                }
                acc
            },
        )
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if `|debit - credit| < tolerance`.
    #[must_use]
    pub fn is_balanced_within(&self, tolerance: Decimal) -> bool {
        self.difference().abs() < tolerance
    }
}
