//! Deterministic rule selection.

use chrono::NaiveDate;
use std::cmp::Ordering;

use super::error::RuleError;
use super::event::{Attributes, PostingEvent};
use super::rule::PostingRule;

/// Stateless rule matcher.
///
/// Rules are read-only at match time. Among applicable rules the lowest
/// priority number wins; ties go to the earliest `effective_from`, then the
/// lexicographically smallest code, then the lowest version.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Finds the rule to apply to an event. Fallback rules never match here.
    ///
    /// # Errors
    ///
    /// Returns `NoRuleMatched` if no rule applies.
    pub fn find_applicable_rule<'a>(
        rules: &'a [PostingRule],
        event: &PostingEvent,
    ) -> Result<&'a PostingRule, RuleError> {
        Self::candidates(
            rules,
            &event.source_type,
            &event.trigger_event,
            event.event_date,
            &event.attributes,
        )
        .into_iter()
        .next()
        .ok_or_else(|| RuleError::NoRuleMatched {
            source_type: event.source_type.clone(),
            trigger_event: event.trigger_event.clone(),
        })
    }

    /// All applicable non-fallback rules, best first.
    #[must_use]
    pub fn candidates<'a>(
        rules: &'a [PostingRule],
        source_type: &str,
        trigger_event: &str,
        as_of: NaiveDate,
        attributes: &Attributes,
    ) -> Vec<&'a PostingRule> {
        let mut matching: Vec<&PostingRule> = rules
            .iter()
            .filter(|r| r.is_active && !r.is_fallback)
            .filter(|r| r.source_type == source_type && r.trigger_event == trigger_event)
            .filter(|r| r.is_effective_on(as_of))
            .filter(|r| r.condition.matches(attributes))
            .collect();
        matching.sort_by(|a, b| Self::precedence(a, b));
        matching
    }

    /// Finds the fallback rule for a source type.
    #[must_use]
    pub fn find_fallback_rule<'a>(
        rules: &'a [PostingRule],
        source_type: &str,
        as_of: NaiveDate,
    ) -> Option<&'a PostingRule> {
        rules
            .iter()
            .filter(|r| r.is_active && r.is_fallback)
            .filter(|r| r.source_type == source_type && r.is_effective_on(as_of))
            .min_by(|a, b| Self::precedence(a, b))
    }

    /// Total order used to pick between applicable rules.
    #[must_use]
    pub fn precedence(a: &PostingRule, b: &PostingRule) -> Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.effective_from.cmp(&b.effective_from))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.version.cmp(&b.version))
    }
}
