//! Posting rules and their versioning.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ledgerflow_shared::types::{CompanyId, PostingRuleId};

use super::condition::Condition;
use super::error::RuleError;
use super::template::{AccountRef, TemplateLine};

/// Default priority for new rules. Lower numbers win.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A versioned, effective-dated posting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRule {
    /// Id of this version.
    pub id: PostingRuleId,
    /// Stable rule code shared by all versions.
    pub code: String,
    /// Version number, starting at 1.
    pub version: i32,
    /// Owning company.
    pub company_id: CompanyId,
    /// Source type the rule handles.
    pub source_type: String,
    /// Trigger event the rule handles. Ignored for fallback rules.
    pub trigger_event: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Conditions on event attributes.
    pub condition: Condition,
    /// Lines to expand.
    pub template: Vec<TemplateLine>,
    /// Lower numbers are tried first.
    pub priority: i32,
    /// First date the rule applies.
    pub effective_from: NaiveDate,
    /// Last date the rule applies, inclusive.
    pub effective_to: Option<NaiveDate>,
    /// Inactive rules never match.
    pub is_active: bool,
    /// Suspense fallback for its source type.
    pub is_fallback: bool,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}

impl PostingRule {
    /// Builds version `version` of a rule from validated input.
    #[must_use]
    pub fn from_new(
        company_id: CompanyId,
        input: NewPostingRule,
        version: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PostingRuleId::new(),
            code: input.code.trim().to_string(),
            version,
            company_id,
            source_type: input.source_type.trim().to_string(),
            trigger_event: input.trigger_event.trim().to_string(),
            description: input.description,
            condition: input.condition,
            template: input.template,
            priority: input.priority,
            effective_from: input.effective_from,
            effective_to: input.effective_to,
            is_active: true,
            is_fallback: input.is_fallback,
            created_at: now,
        }
    }

    /// Returns true if `date` falls in the effective window.
    #[must_use]
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }

    /// JSON copy of the rule for the usage log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Input for creating a rule or a new version of one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostingRule {
    /// Rule code.
    pub code: String,
    /// Source type handled.
    pub source_type: String,
    /// Trigger event handled.
    pub trigger_event: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Conditions; empty matches everything.
    #[serde(default)]
    pub condition: Condition,
    /// Lines to expand.
    pub template: Vec<TemplateLine>,
    /// Priority; lower wins.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// First effective date.
    pub effective_from: NaiveDate,
    /// Last effective date.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Suspense fallback flag.
    #[serde(default)]
    pub is_fallback: bool,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl NewPostingRule {
    /// Validates the rule definition.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.code.trim().is_empty() {
            return Err(RuleError::InvalidRule("code cannot be blank".to_string()));
        }
        if self.source_type.trim().is_empty() {
            return Err(RuleError::InvalidRule(
                "source_type cannot be blank".to_string(),
            ));
        }
        if self.trigger_event.trim().is_empty() {
            return Err(RuleError::InvalidRule(
                "trigger_event cannot be blank".to_string(),
            ));
        }
        if self.template.is_empty() {
            return Err(RuleError::InvalidRule(
                "template needs at least one line".to_string(),
            ));
        }
        if let Some(to) = self.effective_to
            && to < self.effective_from
        {
            return Err(RuleError::InvalidRule(
                "effective_to is before effective_from".to_string(),
            ));
        }
        self.condition.validate()?;
        self.template
            .iter()
            .enumerate()
            .try_for_each(|(idx, line)| line.validate(idx + 1))?;

        // Fallback postings must land on fixed suspense codes, checked against
        // the chart when the rule is stored.
        if self.is_fallback
            && let Some(idx) = self
                .template
                .iter()
                .position(|line| !matches!(line.account, AccountRef::Literal(_)))
        {
            return Err(RuleError::InvalidRule(format!(
                "fallback template line {} must name a suspense account code",
                idx + 1
            )));
        }
        Ok(())
    }
}

/// Closes `previous` so that `next` takes over from its effective date.
///
/// Returns the version number for `next`.
///
/// # Errors
///
/// Returns `InvalidRule` if `next` does not start after `previous`.
pub fn supersede(previous: &mut PostingRule, next: &NewPostingRule) -> Result<i32, RuleError> {
    if next.effective_from <= previous.effective_from {
        return Err(RuleError::InvalidRule(format!(
            "new version of {} must start after {}",
            previous.code, previous.effective_from
        )));
    }
    let day_before = next
        .effective_from
        .pred_opt()
        .ok_or_else(|| RuleError::InvalidRule("effective_from out of range".to_string()))?;
    if previous.effective_to.is_none_or(|to| to > day_before) {
        previous.effective_to = Some(day_before);
    }
    Ok(previous.version + 1)
}
