//! Validation issue types.
//!
//! The Issue enum provides type-safe issue creation where each variant
//! carries only its needed data. Issues are values, never exceptions;
//! the validation boundary returns them as data.

use serde::{Deserialize, Serialize};

use formwork_model::FieldKind;

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Blocks submission
    Error,
    /// Surfaced but never blocks
    Warning,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// Issue category, for grouping in review surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Presence,
    Shape,
    Format,
    Limit,
    Consistency,
    Record,
    Schema,
}

/// Validation issue - each variant carries only its needed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    // Presence checks
    /// Required free-form field is empty
    RequiredEmpty { field: String, label: String },
    /// Required choice field has no selection
    RequiredUnselected { field: String, label: String },

    // Shape checks
    /// Stored value's shape does not fit the field's kind
    ShapeMismatch {
        field: String,
        expected: FieldKind,
        found: String,
    },

    // Format checks
    /// Email field value is not a valid address
    InvalidEmail { field: String, label: String },
    /// Phone field value is not a plausible phone number
    InvalidPhone { field: String, label: String },
    /// Year field value is not a four-digit year
    InvalidYear { field: String, label: String },
    /// Value does not match a custom pattern rule
    PatternMismatch {
        field: String,
        label: String,
        requirement: String,
    },

    // Limit checks
    /// Text value shorter than the rule's minimum length
    TooShort {
        field: String,
        label: String,
        min_len: usize,
        actual: usize,
    },
    /// Text value longer than the rule's maximum length
    TooLong {
        field: String,
        label: String,
        max_len: usize,
        actual: usize,
    },
    /// Numeric value below the field's lower bound
    BelowMinimum {
        field: String,
        label: String,
        min: f64,
        value: f64,
    },
    /// Numeric value above the field's upper bound
    AboveMaximum {
        field: String,
        label: String,
        max: f64,
        value: f64,
    },

    // Consistency checks
    /// Date range whose end precedes its start
    InvalidDateRange { field: String, label: String },

    // Record-level checks
    /// A cross-field rule failed; reported under the synthetic record key
    RecordRule { rule: String, message: String },

    // Schema structure warnings
    /// A field's dependency names no field in the definition
    UnknownDependency { field: String, target: String },
    /// Fields whose dependencies form a cycle
    DependencyCycle { fields: Vec<String> },
}

impl Issue {
    /// Stable rule ID for lookup and log correlation.
    pub fn rule_id(&self) -> &'static str {
        match self {
            Issue::RequiredEmpty { .. } => "FW0001",
            Issue::RequiredUnselected { .. } => "FW0002",
            Issue::ShapeMismatch { .. } => "FW0010",
            Issue::InvalidEmail { .. } => "FW0020",
            Issue::InvalidPhone { .. } => "FW0021",
            Issue::InvalidYear { .. } => "FW0022",
            Issue::PatternMismatch { .. } => "FW0023",
            Issue::TooShort { .. } => "FW0030",
            Issue::TooLong { .. } => "FW0031",
            Issue::BelowMinimum { .. } => "FW0032",
            Issue::AboveMaximum { .. } => "FW0033",
            Issue::InvalidDateRange { .. } => "FW0040",
            Issue::RecordRule { .. } => "FW0050",
            Issue::UnknownDependency { .. } => "FW0060",
            Issue::DependencyCycle { .. } => "FW0061",
        }
    }

    /// Field the issue is keyed to; `None` for record-level issues.
    pub fn field(&self) -> Option<&str> {
        match self {
            Issue::RequiredEmpty { field, .. } => Some(field),
            Issue::RequiredUnselected { field, .. } => Some(field),
            Issue::ShapeMismatch { field, .. } => Some(field),
            Issue::InvalidEmail { field, .. } => Some(field),
            Issue::InvalidPhone { field, .. } => Some(field),
            Issue::InvalidYear { field, .. } => Some(field),
            Issue::PatternMismatch { field, .. } => Some(field),
            Issue::TooShort { field, .. } => Some(field),
            Issue::TooLong { field, .. } => Some(field),
            Issue::BelowMinimum { field, .. } => Some(field),
            Issue::AboveMaximum { field, .. } => Some(field),
            Issue::InvalidDateRange { field, .. } => Some(field),
            Issue::RecordRule { .. } => None,
            Issue::UnknownDependency { field, .. } => Some(field),
            Issue::DependencyCycle { .. } => None,
        }
    }

    /// Category for this issue type.
    pub fn category(&self) -> Category {
        match self {
            // Presence checks
            Issue::RequiredEmpty { .. } => Category::Presence,
            Issue::RequiredUnselected { .. } => Category::Presence,
            // Shape checks
            Issue::ShapeMismatch { .. } => Category::Shape,
            // Format checks
            Issue::InvalidEmail { .. } => Category::Format,
            Issue::InvalidPhone { .. } => Category::Format,
            Issue::InvalidYear { .. } => Category::Format,
            Issue::PatternMismatch { .. } => Category::Format,
            // Limit checks
            Issue::TooShort { .. } => Category::Limit,
            Issue::TooLong { .. } => Category::Limit,
            Issue::BelowMinimum { .. } => Category::Limit,
            Issue::AboveMaximum { .. } => Category::Limit,
            // Consistency checks
            Issue::InvalidDateRange { .. } => Category::Consistency,
            // Record-level checks
            Issue::RecordRule { .. } => Category::Record,
            // Schema structure
            Issue::UnknownDependency { .. } => Category::Schema,
            Issue::DependencyCycle { .. } => Category::Schema,
        }
    }

    /// Severity of this issue. Schema-structure issues warn; everything
    /// else blocks submission.
    pub fn severity(&self) -> Severity {
        match self {
            Issue::UnknownDependency { .. } => Severity::Warning,
            Issue::DependencyCycle { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Format message with issue-specific data.
    pub fn message(&self) -> String {
        match self {
            Issue::RequiredEmpty { label, .. } => format!("{} is required", label),
            Issue::RequiredUnselected { label, .. } => format!("{} is required", label),

            Issue::ShapeMismatch {
                field,
                expected,
                found,
            } => format!(
                "Field {} expects a {} value, found {}",
                field, expected, found
            ),

            Issue::InvalidEmail { label, .. } => {
                format!("{} must be a valid email address", label)
            }
            Issue::InvalidPhone { label, .. } => {
                format!("{} must be a valid phone number", label)
            }
            Issue::InvalidYear { label, .. } => {
                format!("{} must be a four-digit year", label)
            }
            Issue::PatternMismatch {
                label, requirement, ..
            } => format!("{} {}", label, requirement),

            Issue::TooShort {
                label,
                min_len,
                actual,
                ..
            } => format!(
                "{} must be at least {} characters (found {})",
                label, min_len, actual
            ),
            Issue::TooLong {
                label,
                max_len,
                actual,
                ..
            } => format!(
                "{} must be at most {} characters (found {})",
                label, max_len, actual
            ),
            Issue::BelowMinimum {
                label, min, value, ..
            } => format!("{} must be at least {} (found {})", label, min, value),
            Issue::AboveMaximum {
                label, max, value, ..
            } => format!("{} must be at most {} (found {})", label, max, value),

            Issue::InvalidDateRange { label, .. } => {
                format!("{} ends before it starts", label)
            }

            Issue::RecordRule { message, .. } => message.clone(),

            Issue::UnknownDependency { field, target } => format!(
                "Field {} depends on {}, which is not in the form",
                field, target
            ),
            Issue::DependencyCycle { fields } => {
                format!("Fields form a dependency cycle: {}", fields.join(" -> "))
            }
        }
    }
}
