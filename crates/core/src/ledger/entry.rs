//! Journal entry and journal line domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use ledgerflow_shared::types::{
    AccountId, CompanyId, CurrencyCode, JournalEntryId, JournalLineId, PostingRuleId,
};

use crate::workflow::types::JournalStatus;

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/income).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/income).
    Credit,
}

impl EntryType {
    /// Returns the opposite side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the string representation of the side.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of party a line is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubledgerKind {
    /// Customer (receivables).
    Customer,
    /// Vendor (payables).
    Vendor,
    /// Employee (payroll, reimbursements).
    Employee,
}

impl SubledgerKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Employee => "employee",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "vendor" => Some(Self::Vendor),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

/// Subledger reference on a journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubledgerRef {
    /// Party kind.
    pub kind: SubledgerKind,
    /// Party id in the owning module.
    pub id: String,
}

/// A single line of a journal entry.
///
/// Exactly one of `debit_amount` and `credit_amount` is positive; the other is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Line ID.
    pub id: JournalLineId,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// 1-based position within the entry.
    pub line_number: i32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Account code at the time of posting.
    pub account_code: String,
    /// Debit amount (0 on credit lines).
    pub debit_amount: Decimal,
    /// Credit amount (0 on debit lines).
    pub credit_amount: Decimal,
    /// Optional subledger tag.
    pub subledger: Option<SubledgerRef>,
    /// Optional line memo.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Returns the side of this line.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        if self.debit_amount > Decimal::ZERO {
            EntryType::Debit
        } else {
            EntryType::Credit
        }
    }

    /// Returns the non-zero amount of this line.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit_amount.max(self.credit_amount)
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit_amount - self.credit_amount
    }

    /// Returns true if exactly one side carries a positive amount.
    #[must_use]
    pub fn is_single_sided(&self) -> bool {
        let debit = self.debit_amount > Decimal::ZERO;
        let credit = self.credit_amount > Decimal::ZERO;
        debit != credit && self.debit_amount >= Decimal::ZERO && self.credit_amount >= Decimal::ZERO
    }
}

/// A journal entry with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Sequential number per company and fiscal year, e.g. `JV/2024-25/00001`.
    pub journal_number: String,
    /// Fiscal year (calendar year in which it starts).
    pub fiscal_year: i32,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Source document type (idempotency key, part 1).
    pub source_type: String,
    /// Source document id (idempotency key, part 2).
    pub source_id: String,
    /// Human-facing source document number.
    pub source_number: Option<String>,
    /// Event that produced the entry.
    pub trigger_event: Option<String>,
    /// Rule version that produced the entry.
    pub rule_id: Option<PostingRuleId>,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// Sum of debit amounts.
    pub total_debit: Decimal,
    /// Sum of credit amounts.
    pub total_credit: Decimal,
    /// Currency of the source document.
    pub currency: CurrencyCode,
    /// Exchange rate to the base currency (stored only).
    pub exchange_rate: Decimal,
    /// Narration.
    pub narration: Option<String>,
    /// Set when the suspense fallback produced the entry.
    pub needs_reclassification: bool,
    /// The entry this one reverses.
    pub reversal_of: Option<JournalEntryId>,
    /// The entry that reversed this one.
    pub reversed_by: Option<JournalEntryId>,
    /// Why the entry was reversed.
    pub reversal_reason: Option<String>,
    /// Why the entry was cancelled.
    pub cancellation_reason: Option<String>,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last changed.
    pub updated_at: DateTime<Utc>,
    /// Lines in line-number order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Returns true if the entry has affected balances (posted, possibly reversed since).
    #[must_use]
    pub fn affects_balances(&self) -> bool {
        matches!(self.status, JournalStatus::Posted | JournalStatus::Reversed)
    }

    /// Returns true if the entry has no debit/credit difference.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            entry_id: JournalEntryId::new(),
            line_number: 1,
            account_id: AccountId::new(),
            account_code: "1000".to_string(),
            debit_amount: debit,
            credit_amount: credit,
            subledger: None,
            memo: None,
        }
    }

    #[test]
    fn test_line_side_and_amount() {
        let debit = line(dec!(100), Decimal::ZERO);
        assert_eq!(debit.entry_type(), EntryType::Debit);
        assert_eq!(debit.amount(), dec!(100));
        assert_eq!(debit.signed_amount(), dec!(100));

        let credit = line(Decimal::ZERO, dec!(40));
        assert_eq!(credit.entry_type(), EntryType::Credit);
        assert_eq!(credit.signed_amount(), dec!(-40));
    }

    #[test]
    fn test_single_sided() {
        assert!(line(dec!(1), Decimal::ZERO).is_single_sided());
        assert!(!line(dec!(1), dec!(1)).is_single_sided());
        assert!(!line(Decimal::ZERO, Decimal::ZERO).is_single_sided());
        assert!(!line(dec!(-1), Decimal::ZERO).is_single_sided());
    }

    #[test]
    fn test_entry_type_opposite() {
        assert_eq!(EntryType::Debit.opposite(), EntryType::Credit);
        assert_eq!(EntryType::Credit.opposite(), EntryType::Debit);
    }

    #[test]
    fn test_subledger_kind_parse() {
        assert_eq!(SubledgerKind::parse("Vendor"), Some(SubledgerKind::Vendor));
        assert_eq!(SubledgerKind::parse("bank"), None);
    }
}
