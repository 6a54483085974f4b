//! Posting rules: from business events to posting lines.
//!
//! - `event` - Posting events and attribute lookups
//! - `condition` - Rule conditions
//! - `template` - Template lines and account references
//! - `rule` - Versioned, effective-dated rules
//! - `matcher` - Deterministic rule selection
//! - `expander` - Template expansion

pub mod condition;
pub mod error;
pub mod event;
pub mod expander;
pub mod matcher;
pub mod rule;
pub mod template;

#[cfg(test)]
mod expander_props;
#[cfg(test)]
mod matcher_props;

pub use condition::Condition;
pub use error::RuleError;
pub use event::{Attributes, PostingEvent};
pub use expander::TemplateExpander;
pub use matcher::RuleMatcher;
pub use rule::{DEFAULT_PRIORITY, NewPostingRule, PostingRule, supersede};
pub use template::{AccountRef, SubledgerTemplate, TemplateLine};
