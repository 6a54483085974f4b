//! Storage seam for the posting engine.
//!
//! The engine talks to storage only through a transaction handle. Everything
//! done on one `LedgerTx` commits together or not at all; dropping a handle
//! without calling [`LedgerTx::commit`] rolls it back.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use ledgerflow_shared::types::{AccountId, CompanyId, JournalEntryId};

use crate::audit::{RuleUsageLog, UsageLogFilter};
use crate::coa::{Account, Company};
use crate::ledger::{JournalEntry, JournalLine, PeriodBalance, PeriodKey, PostedLine};
use crate::posting::PostingRule;
use crate::reports::LedgerLine;
use crate::workflow::JournalStatus;

/// `Duplicate` entity reported when an account code is already taken.
pub const ACCOUNT_ENTITY: &str = "account";

/// Storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Row does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of row.
        entity: &'static str,
        /// Key that was looked up.
        key: String,
    },

    /// A live entry already exists for the idempotency key.
    #[error("Entry already exists for {source_type}/{source_id}")]
    DuplicateSource {
        /// Source document type.
        source_type: String,
        /// Source document id.
        source_id: String,
    },

    /// Another unique key was violated.
    #[error("Duplicate {entity}: {key}")]
    Duplicate {
        /// Kind of row.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// Serialization failure or deadlock; the transaction can be retried.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Statement or lock timeout.
    #[error("Transaction timed out: {0}")]
    Timeout(String),

    /// Any other backend failure.
    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns true if retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Timeout(_))
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateSource { .. } => "DUPLICATE_SOURCE",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::Conflict(_) => "TRANSACTION_CONFLICT",
            Self::Timeout(_) => "TRANSACTION_TIMEOUT",
            Self::Backend(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::DuplicateSource { .. } | Self::Duplicate { .. } => 409,
            Self::Conflict(_) | Self::Timeout(_) => 503,
            Self::Backend(_) => 500,
        }
    }
}

/// Filter for listing journal entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries in this status.
    pub status: Option<JournalStatus>,
    /// Only entries from this source type.
    pub source_type: Option<String>,
    /// Only entries flagged (or not) for reclassification.
    pub needs_reclassification: Option<bool>,
    /// Entry date lower bound (inclusive).
    pub from: Option<NaiveDate>,
    /// Entry date upper bound (inclusive).
    pub to: Option<NaiveDate>,
    /// Page size; zero means no limit.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl EntryFilter {
    /// Returns true if the entry passes every set criterion.
    #[must_use]
    pub fn accepts(&self, entry: &JournalEntry) -> bool {
        self.status.is_none_or(|s| entry.status == s)
            && self
                .source_type
                .as_deref()
                .is_none_or(|s| entry.source_type == s)
            && self
                .needs_reclassification
                .is_none_or(|flag| entry.needs_reclassification == flag)
            && self.from.is_none_or(|d| entry.entry_date >= d)
            && self.to.is_none_or(|d| entry.entry_date <= d)
    }
}

/// A storage backend able to open ledger transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Transaction handle type.
    type Tx: LedgerTx;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Operations available inside one storage transaction.
///
/// Reads of entries and accounts meant for mutation take row locks, so two
/// transactions touching the same rows serialize.
#[async_trait]
pub trait LedgerTx: Send {
    // ---- companies & accounts ----

    /// Loads a company.
    async fn company(&mut self, id: CompanyId) -> Result<Company, StoreError>;

    /// Inserts a company.
    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError>;

    /// All accounts of a company, parents before children.
    async fn accounts(&mut self, company_id: CompanyId) -> Result<Vec<Account>, StoreError>;

    /// Inserts an account. Fails with `Duplicate` if the code is taken.
    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Writes display metadata (name, active flag) of an account.
    async fn update_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Locks the given accounts for update, in the order supplied.
    ///
    /// Callers pass ids in ascending order.
    async fn lock_accounts(
        &mut self,
        company_id: CompanyId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError>;

    /// Adds a signed amount to an account's running balance and returns the
    /// new balance.
    async fn apply_delta(&mut self, account_id: AccountId, delta: Decimal)
    -> Result<Decimal, StoreError>;

    /// Overwrites an account's running balance.
    async fn set_account_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError>;

    // ---- posting rules ----

    /// Rule versions of a company, optionally for one source type.
    async fn rules(
        &mut self,
        company_id: CompanyId,
        source_type: Option<&str>,
    ) -> Result<Vec<PostingRule>, StoreError>;

    /// Inserts a rule version. Fails with `Duplicate` on (code, version).
    async fn insert_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError>;

    /// Writes the window and active flag of a rule version.
    async fn update_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError>;

    // ---- journal ----

    /// Loads and locks an entry with its lines.
    async fn entry(
        &mut self,
        company_id: CompanyId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, StoreError>;

    /// The live (non-cancelled) entry for an idempotency key.
    async fn entry_by_source(
        &mut self,
        company_id: CompanyId,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, StoreError>;

    /// Entries matching a filter, newest entry date first, with lines.
    async fn entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// Number of entries matching a filter, ignoring its limit and offset.
    async fn count_entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<u64, StoreError>;

    /// Increments and returns the journal counter of (company, fiscal year).
    async fn next_journal_sequence(
        &mut self,
        company_id: CompanyId,
        fiscal_year: i32,
    ) -> Result<i64, StoreError>;

    /// Inserts an entry with its lines.
    ///
    /// Fails with `DuplicateSource` if a live entry holds the same key.
    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Writes the header of an entry (status, totals, reversal linkage).
    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Replaces all lines of an entry.
    async fn replace_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError>;

    // ---- period balances ----

    /// The account's latest period row strictly before `key`.
    async fn period_balance_before(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Option<PeriodBalance>, StoreError>;

    /// The account's period rows at or after `key`, ascending.
    async fn period_balances_from(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Vec<PeriodBalance>, StoreError>;

    /// Inserts or updates period rows.
    async fn save_period_balances(&mut self, rows: &[PeriodBalance]) -> Result<(), StoreError>;

    /// Every period row of a company.
    async fn period_balances(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<PeriodBalance>, StoreError>;

    /// Deletes all period rows of a company and writes `rows` instead.
    async fn replace_period_balances(
        &mut self,
        company_id: CompanyId,
        rows: &[PeriodBalance],
    ) -> Result<(), StoreError>;

    // ---- reporting ----

    /// Lines of posted and reversed entries dated up to `to` (all if `None`).
    async fn posted_lines(
        &mut self,
        company_id: CompanyId,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError>;

    /// Posted lines of one account dated up to `to`, in posting order.
    async fn ledger_lines(
        &mut self,
        account_id: AccountId,
        to: NaiveDate,
    ) -> Result<Vec<LedgerLine>, StoreError>;

    // ---- audit ----

    /// Appends a usage log record.
    async fn insert_usage_log(&mut self, log: &RuleUsageLog) -> Result<(), StoreError>;

    /// Usage log records of a company, newest first.
    async fn usage_logs(
        &mut self,
        company_id: CompanyId,
        filter: &UsageLogFilter,
        limit: u64,
    ) -> Result<Vec<RuleUsageLog>, StoreError>;

    /// Commits the transaction.
    async fn commit(self) -> Result<(), StoreError>;
}
