//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entries and lines (debits and credits)
//! - Line validation and the balance invariant
//! - Fiscal calendar and journal numbering
//! - Running and period balance maintenance
//! - Ledger service for entry assembly

pub mod balance;
pub mod entry;
pub mod error;
pub mod fiscal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{
    AccountDelta, BalanceMaintainer, PeriodBalance, PostedLine, RebuiltBalances, RunningBalance,
};
pub use entry::{EntryType, JournalEntry, JournalLine, SubledgerKind, SubledgerRef};
pub use error::LedgerError;
pub use fiscal::{FiscalCalendar, PeriodKey, format_journal_number};
pub use service::{AccountInfo, EntryHeader, LedgerService};
pub use types::{CreateEntryInput, EntryTotals, PostingLine};
