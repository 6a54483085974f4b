//! Template expansion into concrete posting lines.

use rust_decimal::Decimal;

use ledgerflow_shared::types::round_amount;

use super::error::RuleError;
use super::event::{Attributes, value_to_decimal};
use super::template::TemplateLine;
use crate::ledger::types::{EntryTotals, PostingLine};

/// Stateless template expander.
pub struct TemplateExpander;

impl TemplateExpander {
    /// Expands a template against event attributes.
    ///
    /// Amounts are rounded to the ledger scale. Skippable lines whose amount
    /// is zero or absent are dropped. The surviving lines must balance
    /// within `tolerance`.
    ///
    /// # Errors
    ///
    /// - `MissingAmountField` if a required amount is absent or not numeric
    /// - `NegativeAmount` if an amount is below zero
    /// - `UnresolvedAccountReference` if a placeholder has no value
    /// - `UnbalancedTemplate` if the lines do not balance or none remain
    pub fn expand(
        template: &[TemplateLine],
        attributes: &Attributes,
        tolerance: Decimal,
    ) -> Result<Vec<PostingLine>, RuleError> {
        Self::expand_with(template, attributes, None, tolerance)
    }

    /// Expands a suspense fallback template.
    ///
    /// An unmatched event need not carry the fields the fallback template
    /// names, so any line whose own amount is absent or not numeric posts the
    /// event's full amount: the first numeric attribute among
    /// `full_amount_fields`.
    ///
    /// # Errors
    ///
    /// As [`TemplateExpander::expand`]; `MissingAmountField` only when neither
    /// the line's field nor any full-amount field is numeric.
    pub fn expand_fallback(
        template: &[TemplateLine],
        attributes: &Attributes,
        full_amount_fields: &[String],
        tolerance: Decimal,
    ) -> Result<Vec<PostingLine>, RuleError> {
        let full_amount = full_amount_fields
            .iter()
            .find_map(|field| attributes.decimal(field));
        Self::expand_with(template, attributes, full_amount, tolerance)
    }

    fn expand_with(
        template: &[TemplateLine],
        attributes: &Attributes,
        default_amount: Option<Decimal>,
        tolerance: Decimal,
    ) -> Result<Vec<PostingLine>, RuleError> {
        let mut lines = Vec::with_capacity(template.len());

        for (idx, line) in template.iter().enumerate() {
            let raw = attributes.get(&line.amount_field);
            let amount = match raw {
                None if line.skip_if_zero && default_amount.is_none() => continue,
                None => default_amount,
                Some(value) => value_to_decimal(value).or(default_amount),
            }
            .ok_or_else(|| RuleError::MissingAmountField {
                field: line.amount_field.clone(),
                line: idx + 1,
            })?;

            let amount = round_amount(amount);
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(RuleError::NegativeAmount {
                    field: line.amount_field.clone(),
                    amount,
                });
            }
            if amount.is_zero() && line.skip_if_zero {
                continue;
            }

            let account_code = line.account.resolve(attributes)?;
            lines.push(PostingLine {
                account_code,
                entry_type: line.side,
                amount,
                subledger: line.subledger.as_ref().and_then(|s| s.resolve(attributes)),
                memo: line.memo.clone(),
            });
        }

        let totals = EntryTotals::of(&lines);
        if lines.is_empty() || !totals.is_balanced_within(tolerance) {
            return Err(RuleError::UnbalancedTemplate {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::{EntryType, SubledgerKind};
    use crate::posting::template::AccountRef;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const TOLERANCE: Decimal = dec!(0.0001);

    fn gst_template() -> Vec<TemplateLine> {
        vec![
            TemplateLine::debit(AccountRef::literal("1130"), "total_amount")
                .with_subledger(SubledgerKind::Customer, "customer_id"),
            TemplateLine::credit(AccountRef::literal("4100"), "subtotal"),
            TemplateLine::credit(AccountRef::literal("2210"), "total_cgst").skip_if_zero(),
            TemplateLine::credit(AccountRef::literal("2220"), "total_sgst").skip_if_zero(),
            TemplateLine::credit(AccountRef::literal("2230"), "total_igst").skip_if_zero(),
        ]
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        Attributes::from_json(value).unwrap()
    }

    #[test]
    fn test_intra_state_invoice() {
        let lines = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({
                "total_amount": 11800, "subtotal": 10000,
                "total_cgst": 900, "total_sgst": 900, "total_igst": 0,
                "customer_id": "CUST-1"
            })),
            TOLERANCE,
        )
        .unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].entry_type, EntryType::Debit);
        assert_eq!(lines[0].amount, dec!(11800));
        assert_eq!(lines[0].subledger.as_ref().map(|s| s.id.as_str()), Some("CUST-1"));
        assert_eq!(lines[1].amount, dec!(10000));
        assert_eq!(lines[2].account_code, "2210");
        assert_eq!(lines[3].amount, dec!(900));
    }

    #[test]
    fn test_absent_skippable_field_dropped() {
        let lines = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({"total_amount": 11800, "subtotal": 10000, "total_igst": 1800})),
            TOLERANCE,
        )
        .unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].subledger.is_none());
    }

    #[test]
    fn test_missing_required_field() {
        let result = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({"total_amount": 100})),
            TOLERANCE,
        );
        assert!(matches!(
            result,
            Err(RuleError::MissingAmountField { ref field, line: 2 }) if field == "subtotal"
        ));
    }

    #[test]
    fn test_non_numeric_field() {
        let result = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({"total_amount": "abc", "subtotal": 100})),
            TOLERANCE,
        );
        assert!(matches!(result, Err(RuleError::MissingAmountField { line: 1, .. })));
    }

    #[test]
    fn test_negative_amount() {
        let result = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({"total_amount": -5, "subtotal": -5})),
            TOLERANCE,
        );
        assert!(matches!(result, Err(RuleError::NegativeAmount { .. })));
    }

    #[test]
    fn test_unbalanced_template() {
        let result = TemplateExpander::expand(
            &gst_template(),
            &attrs(json!({"total_amount": 11800, "subtotal": 10000, "total_cgst": 900})),
            TOLERANCE,
        );
        assert!(matches!(result, Err(RuleError::UnbalancedTemplate { .. })));
    }

    #[test]
    fn test_all_lines_skipped_is_unbalanced() {
        let template = vec![
            TemplateLine::debit(AccountRef::literal("1"), "a").skip_if_zero(),
            TemplateLine::credit(AccountRef::literal("2"), "a").skip_if_zero(),
        ];
        let result = TemplateExpander::expand(&template, &attrs(json!({"a": 0})), TOLERANCE);
        assert!(matches!(result, Err(RuleError::UnbalancedTemplate { .. })));
    }

    #[test]
    fn test_fallback_uses_full_amount_when_field_absent() {
        let template = vec![
            TemplateLine::debit(AccountRef::literal("9900-ASSET"), "total_amount"),
            TemplateLine::credit(AccountRef::literal("9900-INCOME"), "total_amount"),
        ];
        let fields = vec!["total_amount".to_string(), "grand_total".to_string()];

        let lines = TemplateExpander::expand_fallback(
            &template,
            &attrs(json!({"grand_total": 500})),
            &fields,
            TOLERANCE,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.amount == dec!(500)));

        let missing = TemplateExpander::expand_fallback(
            &template,
            &attrs(json!({"note": "no amounts"})),
            &fields,
            TOLERANCE,
        );
        assert!(matches!(missing, Err(RuleError::MissingAmountField { line: 1, .. })));
    }

    #[test]
    fn test_placeholder_account() {
        let template = vec![
            TemplateLine::debit(AccountRef::placeholder("bank_account"), "amount"),
            TemplateLine::credit(AccountRef::literal("1130"), "amount"),
        ];
        let lines = TemplateExpander::expand(
            &template,
            &attrs(json!({"bank_account": "1210", "amount": "250.00"})),
            TOLERANCE,
        )
        .unwrap();
        assert_eq!(lines[0].account_code, "1210");

        let unresolved = TemplateExpander::expand(&template, &attrs(json!({"amount": 1})), TOLERANCE);
        assert!(matches!(unresolved, Err(RuleError::UnresolvedAccountReference(_))));
    }

    #[test]
    fn test_rounds_to_four_places() {
        let template = vec![
            TemplateLine::debit(AccountRef::literal("1"), "a"),
            TemplateLine::credit(AccountRef::literal("2"), "a"),
        ];
        let lines =
            TemplateExpander::expand(&template, &attrs(json!({"a": "1.00005"})), TOLERANCE).unwrap();
        assert_eq!(lines[0].amount, dec!(1.0000));
    }
}
