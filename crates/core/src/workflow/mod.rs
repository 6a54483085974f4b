//! Journal entry workflow management.
//!
//! This module implements the journal entry lifecycle state machine
//! and reversal of posted entries.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (JournalStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `reversal` - Reversing line creation

pub mod error;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use reversal::{REVERSAL_SOURCE_TYPE, ReversalService};
pub use service::WorkflowService;
pub use types::{JournalStatus, WorkflowAction};
