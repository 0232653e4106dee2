//! Rule sets derived from form definitions.
//!
//! `RuleSet::derive` builds the default per-field rules a definition
//! implies (required flags, kind formats, numeric bounds); explicit
//! overrides and record-level rules are layered on top with builder
//! methods. Validation is a pure function of (rules, record).

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use formwork_model::{FieldKind, FieldValue, FormDefinition, Record};

use crate::issue::Issue;
use crate::report::ValidationReport;
use crate::schema::RecordSchema;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,18}[0-9]$").expect("phone pattern compiles"));

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("year pattern compiles"));

/// Rule construction failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Explicit per-field rule, layered over what the field spec implies.
///
/// Every part is optional; unset parts fall back to the derived defaults.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    pub required: Option<bool>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pattern: Option<(Regex, String)>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = Some(min_len);
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Require text values to match `pattern`. `requirement` completes the
    /// sentence "<label> ..." in the issue message.
    pub fn with_pattern(
        mut self,
        pattern: &str,
        requirement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let compiled = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.pattern = Some((compiled, requirement.into()));
        Ok(self)
    }
}

/// Cross-field rule evaluated against the whole record; returns an error
/// message on failure.
pub type RecordRuleFn = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct RecordRule {
    pub name: String,
    check: RecordRuleFn,
}

/// Snapshot of the per-field facts rule derivation needs.
#[derive(Debug, Clone)]
struct FieldTarget {
    name: String,
    label: String,
    kind: FieldKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

/// The shipped [`RecordSchema`] implementation: rules derived from a form
/// definition plus explicit overrides and record-level rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldTarget>,
    overrides: BTreeMap<String, FieldRule>,
    record_rules: Vec<RecordRule>,
}

impl RuleSet {
    /// Derive the default rules a definition implies.
    pub fn derive(definition: &FormDefinition) -> Self {
        let fields = definition
            .fields()
            .map(|field| FieldTarget {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind,
                required: field.required,
                min: field.min,
                max: field.max,
            })
            .collect();
        Self {
            fields,
            overrides: BTreeMap::new(),
            record_rules: Vec::new(),
        }
    }

    /// Layer an explicit rule over the derived one for `field`.
    pub fn with_rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.overrides.insert(field.into(), rule);
        self
    }

    /// Add a record-level rule, reported under the synthetic record key.
    pub fn with_record_rule(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&Record) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.record_rules.push(RecordRule {
            name: name.into(),
            check: Arc::new(check),
        });
        self
    }

    /// Validate one record. Pure: no internal state, nothing thrown.
    pub fn validate(&self, record: &Record) -> ValidationReport {
        let mut report = ValidationReport::new();

        for target in &self.fields {
            report.extend(self.check_field(target, record));
        }

        for rule in &self.record_rules {
            if let Some(message) = (rule.check)(record) {
                report.push(Issue::RecordRule {
                    rule: rule.name.clone(),
                    message,
                });
            }
        }

        report
    }

    fn check_field(&self, target: &FieldTarget, record: &Record) -> Vec<Issue> {
        let rule = self.overrides.get(&target.name);
        let empty = FieldValue::empty_for(target.kind);
        let value = record.get(&target.name).unwrap_or(&empty);

        if !value.fits_kind(target.kind) {
            return vec![Issue::ShapeMismatch {
                field: target.name.clone(),
                expected: target.kind,
                found: value.shape_name().to_string(),
            }];
        }

        let required = rule
            .and_then(|r| r.required)
            .unwrap_or(target.required);
        if value.is_empty() {
            if required {
                return vec![required_issue(target)];
            }
            return Vec::new();
        }

        let mut issues = Vec::new();
        issues.extend(self.check_format(target, rule, value));
        issues.extend(self.check_limits(target, rule, value));
        issues.extend(check_consistency(target, value));
        issues
    }

    /// Kind-implied format checks plus any custom pattern.
    fn check_format(
        &self,
        target: &FieldTarget,
        rule: Option<&FieldRule>,
        value: &FieldValue,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        let Some(text) = value.as_text() else {
            return issues;
        };

        match target.kind {
            FieldKind::Email if !EMAIL_PATTERN.is_match(text) => {
                issues.push(Issue::InvalidEmail {
                    field: target.name.clone(),
                    label: target.label.clone(),
                });
            }
            FieldKind::Phone if !PHONE_PATTERN.is_match(text) => {
                issues.push(Issue::InvalidPhone {
                    field: target.name.clone(),
                    label: target.label.clone(),
                });
            }
            FieldKind::Year if !YEAR_PATTERN.is_match(text) => {
                issues.push(Issue::InvalidYear {
                    field: target.name.clone(),
                    label: target.label.clone(),
                });
            }
            _ => {}
        }

        if let Some((pattern, requirement)) = rule.and_then(|r| r.pattern.as_ref())
            && !pattern.is_match(text)
        {
            issues.push(Issue::PatternMismatch {
                field: target.name.clone(),
                label: target.label.clone(),
                requirement: requirement.clone(),
            });
        }

        issues
    }

    /// Length bounds on text, numeric bounds on numbers.
    fn check_limits(
        &self,
        target: &FieldTarget,
        rule: Option<&FieldRule>,
        value: &FieldValue,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Some(text) = value.as_text() {
            let actual = text.chars().count();
            if let Some(min_len) = rule.and_then(|r| r.min_len)
                && actual < min_len
            {
                issues.push(Issue::TooShort {
                    field: target.name.clone(),
                    label: target.label.clone(),
                    min_len,
                    actual,
                });
            }
            if let Some(max_len) = rule.and_then(|r| r.max_len)
                && actual > max_len
            {
                issues.push(Issue::TooLong {
                    field: target.name.clone(),
                    label: target.label.clone(),
                    max_len,
                    actual,
                });
            }
        }

        if let Some(number) = value.as_number() {
            let min = rule.and_then(|r| r.min).or(target.min);
            let max = rule.and_then(|r| r.max).or(target.max);
            if let Some(min) = min
                && number < min
            {
                issues.push(Issue::BelowMinimum {
                    field: target.name.clone(),
                    label: target.label.clone(),
                    min,
                    value: number,
                });
            }
            if let Some(max) = max
                && number > max
            {
                issues.push(Issue::AboveMaximum {
                    field: target.name.clone(),
                    label: target.label.clone(),
                    max,
                    value: number,
                });
            }
        }

        issues
    }
}

fn required_issue(target: &FieldTarget) -> Issue {
    if target.kind.selects_from_options() {
        Issue::RequiredUnselected {
            field: target.name.clone(),
            label: target.label.clone(),
        }
    } else {
        Issue::RequiredEmpty {
            field: target.name.clone(),
            label: target.label.clone(),
        }
    }
}

fn check_consistency(target: &FieldTarget, value: &FieldValue) -> Vec<Issue> {
    if let FieldValue::DateRange { start, end } = value
        && end < start
    {
        return vec![Issue::InvalidDateRange {
            field: target.name.clone(),
            label: target.label.clone(),
        }];
    }
    Vec::new()
}

impl RecordSchema for RuleSet {
    fn validate(&self, record: &Record) -> ValidationReport {
        RuleSet::validate(self, record)
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("fields", &self.fields.len())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field(
                "record_rules",
                &self
                    .record_rules
                    .iter()
                    .map(|rule| rule.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
