//! Business events and their attribute bags.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use ledgerflow_shared::types::{CompanyId, CurrencyCode};

/// Flat attribute map carried by a posting event.
///
/// Lookups use the flat key first and then allow one level of object
/// traversal, so `"tax.cgst"` finds either a literal `"tax.cgst"` key or
/// `{"tax": {"cgst": ..}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds attributes from a JSON object; other JSON values yield `None`.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Inserts or replaces an attribute.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up an attribute by flat key or dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }
        let (head, tail) = path.split_once('.')?;
        self.0.get(head)?.as_object()?.get(tail)
    }

    /// Looks up an attribute and reads it as a decimal.
    #[must_use]
    pub fn decimal(&self, path: &str) -> Option<Decimal> {
        self.get(path).and_then(value_to_decimal)
    }

    /// Looks up a non-blank string attribute.
    #[must_use]
    pub fn string(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the underlying JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reads a JSON number or numeric string as a decimal.
#[must_use]
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// A business event to be turned into a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingEvent {
    /// Owning company.
    pub company_id: CompanyId,
    /// Source document type, e.g. `invoice`.
    pub source_type: String,
    /// Source document id; with `source_type` forms the idempotency key.
    pub source_id: String,
    /// Human-facing document number.
    #[serde(default)]
    pub source_number: Option<String>,
    /// Lifecycle event, e.g. `on_finalize`.
    pub trigger_event: String,
    /// Facts the rules match on and the template reads amounts from.
    #[serde(default)]
    pub attributes: Attributes,
    /// Accounting date.
    pub event_date: NaiveDate,
    /// Narration for the entry.
    #[serde(default)]
    pub narration: Option<String>,
    /// Document currency.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    /// Rate to the base currency.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
}
