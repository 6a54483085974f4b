//! Rule conditions evaluated against event attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RuleError;
use super::event::{Attributes, value_to_decimal};

/// Condition tree stored as JSON on a posting rule.
///
/// ```json
/// {"op": "all", "conditions": [{"op": "eq", "field": "is_export", "value": false}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Every child condition holds. Empty matches everything.
    All {
        /// Child conditions.
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    /// Attribute at `field` equals `value`.
    Eq {
        /// Attribute path.
        field: String,
        /// Expected value.
        value: Value,
    },
}

impl Default for Condition {
    fn default() -> Self {
        Self::always()
    }
}

impl Condition {
    /// A condition that matches every event.
    #[must_use]
    pub fn always() -> Self {
        Self::All {
            conditions: Vec::new(),
        }
    }

    /// Single equality condition.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction of equality conditions.
    #[must_use]
    pub fn all_eq<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::All {
            conditions: pairs.into_iter().map(|(k, v)| Self::eq(k, v)).collect(),
        }
    }

    /// Evaluates the condition against event attributes.
    ///
    /// A missing attribute never equals anything, including `null`.
    #[must_use]
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            Self::All { conditions } => conditions.iter().all(|c| c.matches(attributes)),
            Self::Eq { field, value } => attributes
                .get(field)
                .is_some_and(|actual| values_equal(actual, value)),
        }
    }

    /// Checks that every field path is non-blank.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            Self::All { conditions } => conditions.iter().try_for_each(Self::validate),
            Self::Eq { field, .. } if field.trim().is_empty() => Err(RuleError::InvalidRule(
                "condition field cannot be blank".to_string(),
            )),
            Self::Eq { .. } => Ok(()),
        }
    }
}

/// JSON equality, except two numbers compare by decimal value.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_)) => {
            match (value_to_decimal(actual), value_to_decimal(expected)) {
                (Some(a), Some(b)) => a == b,
                _ => actual == expected,
            }
        }
        _ => actual == expected,
    }
}
