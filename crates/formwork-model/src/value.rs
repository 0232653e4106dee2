//! Field values and the record owned by the form controller.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;

use crate::field::FieldKind;
use crate::options::OptionItem;

/// Current value of one field.
///
/// Equality is structural; the engine compares values, never identities,
/// when deciding whether a dependency changed or a reset is genuine.
/// Serializes to the natural JSON shape (string, number, bool, object,
/// array, null) for the record mirror.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Text(String),
    Number(f64),
    Flag(bool),
    Choice(OptionItem),
    Choices(Vec<OptionItem>),
    Date(NaiveDate),
    DateRange { start: NaiveDate, end: NaiveDate },
    Time(NaiveTime),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        FieldValue::Number(value)
    }

    pub fn flag(value: bool) -> Self {
        FieldValue::Flag(value)
    }

    /// A single selection with the given submission value and label.
    pub fn choice(value: impl Into<String>, label: impl Into<String>) -> Self {
        FieldValue::Choice(OptionItem::new(value, label))
    }

    pub fn choices(items: Vec<OptionItem>) -> Self {
        FieldValue::Choices(items)
    }

    /// The empty/unset value for a field of the given kind.
    ///
    /// Toggle kinds default to an explicit `false`, multi-selects to an
    /// empty selection; everything else is unset.
    pub fn empty_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox | FieldKind::Switch => FieldValue::Flag(false),
            FieldKind::MultiSelect => FieldValue::Choices(Vec::new()),
            _ => FieldValue::Empty,
        }
    }

    /// Returns true if this value counts as empty for load triggering and
    /// required-field validation.
    ///
    /// An unset toggle (`Flag(false)`) is empty; a numeric zero is not.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Flag(v) => !v,
            FieldValue::Choices(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&OptionItem> {
        match self {
            FieldValue::Choice(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_choices(&self) -> Option<&[OptionItem]> {
        match self {
            FieldValue::Choices(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in validation messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            FieldValue::Empty => "empty",
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Flag(_) => "flag",
            FieldValue::Choice(_) => "selection",
            FieldValue::Choices(_) => "selections",
            FieldValue::Date(_) => "date",
            FieldValue::DateRange { .. } => "date range",
            FieldValue::Time(_) => "time",
        }
    }

    /// Returns true if this value's shape fits a field of the given kind.
    ///
    /// `Empty` fits every kind.
    pub fn fits_kind(&self, kind: FieldKind) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(_) => kind.is_textual(),
            FieldValue::Number(_) => kind == FieldKind::Number,
            FieldValue::Flag(_) => matches!(kind, FieldKind::Checkbox | FieldKind::Switch),
            FieldValue::Choice(_) => matches!(kind, FieldKind::Select | FieldKind::Radio),
            FieldValue::Choices(_) => kind == FieldKind::MultiSelect,
            FieldValue::Date(_) => kind == FieldKind::Date,
            FieldValue::DateRange { .. } => kind == FieldKind::DateRange,
            FieldValue::Time(_) => kind == FieldKind::Time,
        }
    }

    /// Coerce an externally supplied JSON value into a field value of the
    /// given kind. Returns `None` for shapes that do not fit the kind;
    /// callers ignore such entries rather than failing the whole record.
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(Self::empty_for(kind));
        }
        match kind {
            FieldKind::Text
            | FieldKind::TextArea
            | FieldKind::Password
            | FieldKind::Email
            | FieldKind::Phone => value.as_str().map(Self::text),
            FieldKind::Year => match value {
                Value::String(s) => Some(Self::text(s.clone())),
                Value::Number(n) => n.as_i64().map(|y| Self::text(y.to_string())),
                _ => None,
            },
            FieldKind::Number => value.as_f64().map(FieldValue::Number),
            FieldKind::Select | FieldKind::Radio => {
                option_from_json(value).map(FieldValue::Choice)
            }
            FieldKind::MultiSelect => {
                let items = value.as_array()?;
                let coerced: Option<Vec<OptionItem>> =
                    items.iter().map(option_from_json).collect();
                coerced.map(FieldValue::Choices)
            }
            FieldKind::Checkbox | FieldKind::Switch => value.as_bool().map(FieldValue::Flag),
            FieldKind::Date => value.as_str()?.parse::<NaiveDate>().ok().map(FieldValue::Date),
            FieldKind::DateRange => {
                let start = value.get("start")?.as_str()?.parse::<NaiveDate>().ok()?;
                let end = value.get("end")?.as_str()?.parse::<NaiveDate>().ok()?;
                Some(FieldValue::DateRange { start, end })
            }
            FieldKind::Time => value.as_str().and_then(parse_time).map(FieldValue::Time),
        }
    }
}

/// Parse an option item from either a `{value, label}` object or a bare
/// string (label defaults to the value).
fn option_from_json(value: &Value) -> Option<OptionItem> {
    match value {
        Value::String(s) => Some(OptionItem::from_value(s.clone())),
        Value::Object(map) => {
            let value = map.get("value")?.as_str()?;
            let label = map.get("label").and_then(Value::as_str).unwrap_or(value);
            Some(OptionItem::new(value, label))
        }
        _ => None,
    }
}

/// Accepts `HH:MM:SS` and the `HH:MM` short form used by time widgets.
fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Mapping from field name to current value.
///
/// Ordered for deterministic iteration and serialization. Owned exclusively
/// by the form controller; collaborators receive clones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// JSON mirror of the record, in the shape collaborators that track
    /// form state expect.
    pub fn serialize_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, FieldValue)> for Record {
    fn extend<T: IntoIterator<Item = (String, FieldValue)>>(&mut self, iter: T) {
        self.values.extend(iter);
    }
}
