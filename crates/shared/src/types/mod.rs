//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{AMOUNT_SCALE, CurrencyCode, round_amount};
pub use pagination::{PageRequest, PageResponse};
