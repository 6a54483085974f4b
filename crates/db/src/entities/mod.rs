//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod companies;
pub mod journal_entries;
pub mod journal_lines;
pub mod journal_sequences;
pub mod period_balances;
pub mod posting_rules;
pub mod rule_usage_logs;
pub mod sea_orm_active_enums;
