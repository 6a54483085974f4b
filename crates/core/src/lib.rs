//! Core ledger logic for Ledgerflow.
//!
//! This crate holds the domain types, validation rules, balance arithmetic and
//! the posting engine. It has no web or SQL dependencies; storage is reached
//! through the `engine::LedgerStore` trait.
//!
//! # Modules
//!
//! - `coa` - Chart of accounts and suspense accounts
//! - `posting` - Posting rules, matching and template expansion
//! - `ledger` - Journal entries, validation, numbering and balances
//! - `workflow` - Entry lifecycle and reversals
//! - `audit` - Rule usage log
//! - `reports` - Trial balance, balance sheet, income statement, account ledger
//! - `engine` - Storage seam and the transactional posting engine

pub mod audit;
pub mod coa;
pub mod engine;
pub mod ledger;
pub mod posting;
pub mod reports;
pub mod workflow;
