//! Property-based tests for rule selection.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use ledgerflow_shared::types::CompanyId;

use super::condition::Condition;
use super::event::{Attributes, PostingEvent};
use super::matcher::RuleMatcher;
use super::rule::{NewPostingRule, PostingRule};
use super::template::{AccountRef, TemplateLine};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

fn make_rule(code: String, priority: i32, offset_days: u64) -> PostingRule {
    PostingRule::from_new(
        CompanyId::new(),
        NewPostingRule {
            code,
            source_type: "invoice".to_string(),
            trigger_event: "on_finalize".to_string(),
            description: None,
            condition: Condition::always(),
            template: vec![TemplateLine::debit(AccountRef::literal("1130"), "total")],
            priority,
            effective_from: base_date() + chrono::Days::new(offset_days),
            effective_to: None,
            is_fallback: false,
        },
        1,
        Utc::now(),
    )
}

/// Strategy for a set of rules with colliding priorities and dates.
fn arb_rules() -> impl Strategy<Value = Vec<PostingRule>> {
    prop::collection::vec(("[A-E]{1,2}", 1i32..4, 0u64..3), 1..8).prop_map(|defs| {
        defs
            .into_iter()
            .map(|(code, priority, offset)| make_rule(code, priority, offset))
            .collect()
    })
}

fn event() -> PostingEvent {
    PostingEvent {
        company_id: CompanyId::new(),
        source_type: "invoice".to_string(),
        source_id: "INV-1".to_string(),
        source_number: None,
        trigger_event: "on_finalize".to_string(),
        attributes: Attributes::new(),
        event_date: base_date() + chrono::Days::new(10),
        narration: None,
        currency: None,
        exchange_rate: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Insertion order never changes which rule wins.
    #[test]
    fn prop_selection_ignores_insertion_order(rules in arb_rules()) {
        let mut reversed = rules.clone();
        reversed.reverse();

        let a = RuleMatcher::find_applicable_rule(&rules, &event()).unwrap();
        let b = RuleMatcher::find_applicable_rule(&reversed, &event()).unwrap();
        prop_assert_eq!(a.id, b.id);
    }

    /// The winner has the lowest priority of all candidates, and no candidate
    /// sorts strictly before it.
    #[test]
    fn prop_winner_is_minimal(rules in arb_rules()) {
        let winner = RuleMatcher::find_applicable_rule(&rules, &event()).unwrap();
        let min_priority = rules.iter().map(|r| r.priority).min().unwrap();
        prop_assert_eq!(winner.priority, min_priority);
        for rule in &rules {
            prop_assert_ne!(
                RuleMatcher::precedence(rule, winner),
                std::cmp::Ordering::Less
            );
        }
    }

    /// Matching is pure: repeated calls agree.
    #[test]
    fn prop_matching_is_repeatable(rules in arb_rules()) {
        let first = RuleMatcher::find_applicable_rule(&rules, &event()).unwrap().id;
        let second = RuleMatcher::find_applicable_rule(&rules, &event()).unwrap().id;
        prop_assert_eq!(first, second);
    }
}
