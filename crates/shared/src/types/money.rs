//! Currency codes and amount precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every ledger amount is a `rust_decimal::Decimal` rounded to [`AMOUNT_SCALE`] places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places stored for every journal amount.
pub const AMOUNT_SCALE: u32 = 4;

/// Rounds an amount to the ledger scale using Banker's Rounding.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// ISO 4217 currency code (e.g. "INR", "USD").
///
/// The ledger stores the currency and exchange rate of an entry but performs
/// no conversion, so any well-formed three-letter code is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not exactly three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, String> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(format!("Unknown currency: {code}"))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self("INR".to_string())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
