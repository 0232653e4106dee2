use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::options::OptionSource;
use crate::value::FieldValue;

/// Widget kind of a form field.
///
/// The set is closed: rendering dispatches exhaustively on it, and the
/// validation rules derived for a field follow from it. Kind names
/// round-trip the lowercase identifiers used by form definitions
/// (`singledate` for [`FieldKind::Date`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    TextArea,
    Password,
    Email,
    Phone,
    Year,
    Number,
    Select,
    MultiSelect,
    Radio,
    Checkbox,
    Switch,
    #[serde(rename = "singledate")]
    Date,
    DateRange,
    Time,
}

impl FieldKind {
    /// Returns true if values of this kind are selected from an option list.
    pub fn selects_from_options(&self) -> bool {
        matches!(
            self,
            FieldKind::Select | FieldKind::MultiSelect | FieldKind::Radio
        )
    }

    /// Returns true if this kind holds more than one selection.
    pub fn is_multi(&self) -> bool {
        matches!(self, FieldKind::MultiSelect)
    }

    /// Returns true if values of this kind are free-form text.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::TextArea
                | FieldKind::Password
                | FieldKind::Email
                | FieldKind::Phone
                | FieldKind::Year
        )
    }

    /// Canonical lowercase name as it appears in form definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Password => "password",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Year => "year",
            FieldKind::Number => "number",
            FieldKind::Select => "select",
            FieldKind::MultiSelect => "multiselect",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Switch => "switch",
            FieldKind::Date => "singledate",
            FieldKind::DateRange => "daterange",
            FieldKind::Time => "time",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldKind::Text),
            "textarea" => Ok(FieldKind::TextArea),
            "password" => Ok(FieldKind::Password),
            "email" => Ok(FieldKind::Email),
            "phone" => Ok(FieldKind::Phone),
            "year" => Ok(FieldKind::Year),
            "number" => Ok(FieldKind::Number),
            "select" => Ok(FieldKind::Select),
            "multiselect" => Ok(FieldKind::MultiSelect),
            "radio" => Ok(FieldKind::Radio),
            "checkbox" => Ok(FieldKind::Checkbox),
            "switch" => Ok(FieldKind::Switch),
            "singledate" | "date" => Ok(FieldKind::Date),
            "daterange" => Ok(FieldKind::DateRange),
            "time" => Ok(FieldKind::Time),
            _ => Err(format!("Unknown field kind: {}", s)),
        }
    }
}

/// Hook invoked after a field's value change is accepted.
pub type ChangeHook = Arc<dyn Fn(&FieldValue) + Send + Sync>;

/// Hook invoked when a field loses focus.
pub type BlurHook = Arc<dyn Fn() + Send + Sync>;

/// Immutable description of one form field.
///
/// Hooks are explicit function values stored on the spec and invoked by the
/// form controller; they are not re-derived from ambient context. A spec
/// with `depends_on` set watches the named field's value and reloads its
/// options whenever that value changes.
#[derive(Clone)]
pub struct FieldSpec {
    /// Unique name within a form instance.
    pub name: String,
    /// Human-readable label, used in derived validation messages.
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Rendering hint only; a disabled field still validates.
    pub disabled: bool,
    /// Rendering hint only.
    pub placeholder: Option<String>,
    /// Name of the field whose value this field's option source depends on.
    pub depends_on: Option<String>,
    /// Lower numeric bound, validated for [`FieldKind::Number`] values.
    pub min: Option<f64>,
    /// Upper numeric bound, validated for [`FieldKind::Number`] values.
    pub max: Option<f64>,
    pub options: OptionSource,
    pub on_change: Option<ChangeHook>,
    pub on_blur: Option<BlurHook>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            required: false,
            disabled: false,
            placeholder: None,
            depends_on: None,
            min: None,
            max: None,
            options: OptionSource::None,
            on_change: None,
            on_blur: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Watch another field's value as this field's option-load input.
    pub fn with_dependency(mut self, source: impl Into<String>) -> Self {
        self.depends_on = Some(source.into());
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

    pub fn with_options(mut self, source: OptionSource) -> Self {
        self.options = source;
        self
    }

    pub fn with_change_hook(mut self, hook: ChangeHook) -> Self {
        self.on_change = Some(hook);
        self
    }

    pub fn with_blur_hook(mut self, hook: BlurHook) -> Self {
        self.on_blur = Some(hook);
        self
    }

    /// Returns true if this field's option source is asynchronous.
    pub fn has_async_options(&self) -> bool {
        self.options.is_async()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .field("depends_on", &self.depends_on)
            .field("options", &self.options)
            .field("on_change", &self.on_change.as_ref().map(|_| "hook"))
            .field("on_blur", &self.on_blur.as_ref().map(|_| "hook"))
            .finish_non_exhaustive()
    }
}
