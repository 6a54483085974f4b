//! Chart of accounts.
//!
//! Hierarchical ledger accounts with a fixed normal balance and a running
//! balance that only the balance maintainer mutates.

pub mod chart;
pub mod error;
pub mod suspense;
pub mod types;

pub use chart::ChartOfAccounts;
pub use error::CoaError;
pub use suspense::{SUSPENSE_CODE_PREFIX, missing_suspense_accounts, suspense_account, suspense_code};
pub use types::{Account, AccountType, Company, NewAccount, NewCompany, NormalBalance};
