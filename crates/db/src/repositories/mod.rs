//! Repository abstractions for data access.
//!
//! Repositories borrow a connection, which may be a pooled connection or an
//! open transaction, and translate between `SeaORM` models and the domain
//! types of `ledgerflow-core`.

pub mod account;
pub mod company;
pub mod journal;
pub mod period_balance;
pub mod rule;
pub mod usage_log;

pub use account::AccountRepository;
pub use company::CompanyRepository;
pub use journal::JournalRepository;
pub use period_balance::PeriodBalanceRepository;
pub use rule::RuleRepository;
pub use usage_log::UsageLogRepository;
