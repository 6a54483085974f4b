//! Posting templates: the lines a rule expands into.

use serde::{Deserialize, Serialize};

use super::error::RuleError;
use super::event::Attributes;
use crate::ledger::entry::{EntryType, SubledgerKind, SubledgerRef};

/// Where a template line posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRef {
    /// A fixed account code.
    Literal(String),
    /// An attribute that holds the account code.
    Placeholder(String),
}

impl AccountRef {
    /// Fixed account code.
    #[must_use]
    pub fn literal(code: impl Into<String>) -> Self {
        Self::Literal(code.into())
    }

    /// Account code taken from the named attribute.
    #[must_use]
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::Placeholder(name.into())
    }

    /// Resolves the reference to an account code.
    pub fn resolve(&self, attributes: &Attributes) -> Result<String, RuleError> {
        match self {
            Self::Literal(code) => Ok(code.clone()),
            Self::Placeholder(name) => attributes
                .string(name)
                .map(str::to_string)
                .ok_or_else(|| RuleError::UnresolvedAccountReference(name.clone())),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Literal(s) | Self::Placeholder(s) => s.trim().is_empty(),
        }
    }
}

/// Subledger tag whose party id is read from the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubledgerTemplate {
    /// Party kind.
    pub kind: SubledgerKind,
    /// Attribute holding the party id.
    pub id_field: String,
}

impl SubledgerTemplate {
    /// Resolves the tag; absent ids leave the line untagged.
    #[must_use]
    pub fn resolve(&self, attributes: &Attributes) -> Option<SubledgerRef> {
        attributes.string(&self.id_field).map(|id| SubledgerRef {
            kind: self.kind,
            id: id.to_string(),
        })
    }
}

/// One line of a posting template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLine {
    /// Account to post to.
    pub account: AccountRef,
    /// Debit or credit.
    pub side: EntryType,
    /// Attribute path holding the amount.
    pub amount_field: String,
    /// Drop the line when the amount is zero or absent.
    #[serde(default)]
    pub skip_if_zero: bool,
    /// Optional subledger tag.
    #[serde(default)]
    pub subledger: Option<SubledgerTemplate>,
    /// Optional memo copied to the journal line.
    #[serde(default)]
    pub memo: Option<String>,
}

impl TemplateLine {
    /// Debit line reading its amount from `amount_field`.
    #[must_use]
    pub fn debit(account: AccountRef, amount_field: impl Into<String>) -> Self {
        Self::new(account, EntryType::Debit, amount_field)
    }

    /// Credit line reading its amount from `amount_field`.
    #[must_use]
    pub fn credit(account: AccountRef, amount_field: impl Into<String>) -> Self {
        Self::new(account, EntryType::Credit, amount_field)
    }

    fn new(account: AccountRef, side: EntryType, amount_field: impl Into<String>) -> Self {
        Self {
            account,
            side,
            amount_field: amount_field.into(),
            skip_if_zero: false,
            subledger: None,
            memo: None,
        }
    }

    /// Marks the line as dropped when its amount is zero or absent.
    #[must_use]
    pub fn skip_if_zero(mut self) -> Self {
        self.skip_if_zero = true;
        self
    }

    /// Tags the line with a subledger party.
    #[must_use]
    pub fn with_subledger(mut self, kind: SubledgerKind, id_field: impl Into<String>) -> Self {
        self.subledger = Some(SubledgerTemplate {
            kind,
            id_field: id_field.into(),
        });
        self
    }

    /// Checks the line is fully specified.
    pub fn validate(&self, line: usize) -> Result<(), RuleError> {
        if self.account.is_blank() {
            return Err(RuleError::InvalidRule(format!(
                "template line {line} has a blank account reference"
            )));
        }
        if self.amount_field.trim().is_empty() {
            return Err(RuleError::InvalidRule(format!(
                "template line {line} has a blank amount field"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_resolves_to_itself() {
        let r = AccountRef::literal("1100");
        assert_eq!(r.resolve(&Attributes::new()).unwrap(), "1100");
    }

    #[test]
    fn test_placeholder_resolution() {
        let attrs = Attributes::from_json(json!({"bank_account": "1210"})).unwrap();
        let r = AccountRef::placeholder("bank_account");
        assert_eq!(r.resolve(&attrs).unwrap(), "1210");

        let missing = AccountRef::placeholder("cash_account");
        assert!(matches!(
            missing.resolve(&attrs),
            Err(RuleError::UnresolvedAccountReference(name)) if name == "cash_account"
        ));
    }

    #[test]
    fn test_account_ref_serde() {
        let json = serde_json::to_value(AccountRef::placeholder("bank")).unwrap();
        assert_eq!(json, json!({"placeholder": "bank"}));
    }

    #[test]
    fn test_template_line_serde_defaults() {
        let line: TemplateLine = serde_json::from_value(json!({
            "account": {"literal": "4100"},
            "side": "credit",
            "amount_field": "subtotal"
        }))
        .unwrap();
        assert_eq!(line, TemplateLine::credit(AccountRef::literal("4100"), "subtotal"));
    }

    #[test]
    fn test_subledger_resolution() {
        let line = TemplateLine::debit(AccountRef::literal("1130"), "total")
            .with_subledger(SubledgerKind::Customer, "customer_id");
        let attrs = Attributes::from_json(json!({"customer_id": "CUST-9"})).unwrap();
        let tag = line.subledger.as_ref().and_then(|s| s.resolve(&attrs)).unwrap();
        assert_eq!(tag.kind, SubledgerKind::Customer);
        assert_eq!(tag.id, "CUST-9");
    }

    #[test]
    fn test_validate_blank_parts() {
        let blank_account = TemplateLine::debit(AccountRef::literal(" "), "x");
        assert!(blank_account.validate(1).is_err());
        let blank_field = TemplateLine::debit(AccountRef::literal("1100"), "");
        assert!(blank_field.validate(1).is_err());
    }
}
