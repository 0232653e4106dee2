//! Record validation for Formwork forms.
//!
//! The [`RecordSchema`] trait is the boundary the engine consumes: an
//! opaque object that turns a record into a [`ValidationReport`]. The
//! shipped implementation, [`RuleSet`], derives its rules from the form
//! definition and accepts explicit per-field overrides and record-level
//! rules. Issues are data; nothing in this crate throws into the caller.

pub mod issue;
pub mod report;
pub mod rules;
pub mod schema;

pub use issue::{Category, Issue, Severity};
pub use report::{RECORD_KEY, ValidationReport};
pub use rules::{FieldRule, RecordRuleFn, RuleError, RuleSet};
pub use schema::RecordSchema;
