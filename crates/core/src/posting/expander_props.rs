//! Property-based tests for template expansion.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;

use super::event::Attributes;
use super::expander::TemplateExpander;
use super::template::{AccountRef, TemplateLine};
use crate::ledger::entry::EntryType;
use crate::ledger::types::EntryTotals;

const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Strategy for amounts with up to four decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// A template crediting each part separately against a debit of the total.
fn split_template(parts: usize) -> Vec<TemplateLine> {
    let mut template = vec![TemplateLine::debit(AccountRef::literal("1130"), "total")];
    for i in 0..parts {
        template.push(
            TemplateLine::credit(AccountRef::literal(format!("4{i:03}")), format!("part_{i}"))
                .skip_if_zero(),
        );
    }
    template
}

fn attributes(parts: &[Decimal]) -> Attributes {
    let total: Decimal = parts.iter().copied().sum();
    let mut attrs = Attributes::new();
    attrs.insert("total", Value::String(total.to_string()));
    for (i, part) in parts.iter().enumerate() {
        attrs.insert(format!("part_{i}"), Value::String(part.to_string()));
    }
    attrs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whenever expansion succeeds the lines balance and carry positive amounts.
    #[test]
    fn prop_expansion_balances(parts in prop::collection::vec(arb_amount(), 1..6)) {
        prop_assume!(parts.iter().any(|p| !p.is_zero()));
        let template = split_template(parts.len());
        if let Ok(lines) = TemplateExpander::expand(&template, &attributes(&parts), TOLERANCE) {
            let totals = EntryTotals::of(&lines);
            prop_assert_eq!(totals.debit, totals.credit);
            prop_assert!(lines.iter().all(|l| l.amount > Decimal::ZERO));
        }
    }

    /// Zero parts are dropped; the rest survive in template order.
    #[test]
    fn prop_zero_parts_skipped(parts in prop::collection::vec(arb_amount(), 1..6)) {
        prop_assume!(parts.iter().any(|p| !p.is_zero()));
        let template = split_template(parts.len());
        let lines = TemplateExpander::expand(&template, &attributes(&parts), TOLERANCE).unwrap();

        let credits: Vec<Decimal> = lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Credit)
            .map(|l| l.amount)
            .collect();
        let expected: Vec<Decimal> = parts.iter().copied().filter(|p| !p.is_zero()).collect();
        prop_assert_eq!(credits, expected);
    }

    /// Skewing the debit side by at least the tolerance is always rejected.
    #[test]
    fn prop_skew_rejected(parts in prop::collection::vec(arb_amount(), 1..6), skew in 1i64..1_000_000) {
        let template = split_template(parts.len());
        let mut attrs = attributes(&parts);
        let total: Decimal = parts.iter().copied().sum::<Decimal>() + Decimal::new(skew, 4);
        attrs.insert("total", Value::String(total.to_string()));
        prop_assert!(TemplateExpander::expand(&template, &attrs, TOLERANCE).is_err());
    }
}
