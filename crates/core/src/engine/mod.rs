//! Posting engine and its storage seam.
//!
//! - `store` - `LedgerStore`/`LedgerTx` traits implemented by storage backends
//! - `memory` - In-memory store for tests and local runs
//! - `service` - `PostingEngine`, the transactional orchestration
//! - `config` - Engine settings
//! - `error` - `EngineError` and its disposition

pub mod config;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use error::{Disposition, EngineError};
pub use memory::{MemoryLedgerStore, MemoryTx};
pub use service::PostingEngine;
pub use store::{ACCOUNT_ENTITY, EntryFilter, LedgerStore, LedgerTx, StoreError};
pub use types::{BalanceDrift, CreateResult, EventResult, ReconciliationReport, ReversalResult};
