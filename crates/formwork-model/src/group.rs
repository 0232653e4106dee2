use serde_json::Value;

use crate::field::FieldSpec;
use crate::value::{FieldValue, Record};

/// Ordered group of fields under one heading.
///
/// Grouping is a presentation concern; dependencies may cross groups.
#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

impl FieldGroup {
    pub fn new(title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }
}

/// The full declarative schema of one form instance: every group in display
/// order. Supplied once per instantiation; a different definition means a
/// fresh engine instance, not a live migration.
#[derive(Debug, Clone, Default)]
pub struct FormDefinition {
    groups: Vec<FieldGroup>,
}

impl FormDefinition {
    pub fn new(groups: Vec<FieldGroup>) -> Self {
        Self { groups }
    }

    /// Single anonymous group, for forms without headings.
    pub fn from_fields(fields: Vec<FieldSpec>) -> Self {
        Self {
            groups: vec![FieldGroup::new("", fields)],
        }
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// All fields across groups, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.groups.iter().flat_map(|group| group.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_count(&self) -> usize {
        self.groups.iter().map(|group| group.fields.len()).sum()
    }

    /// Record with every field at its kind's empty value.
    pub fn empty_record(&self) -> Record {
        self.fields()
            .map(|field| {
                (
                    field.name.clone(),
                    FieldValue::empty_for(field.kind),
                )
            })
            .collect()
    }

    /// Record seeded from supplied initial values.
    ///
    /// Known fields take the supplied value, the rest default to empty;
    /// entries for unknown field names are ignored.
    pub fn record_from(&self, initial: &Record) -> Record {
        self.fields()
            .map(|field| {
                let value = initial
                    .get(&field.name)
                    .cloned()
                    .unwrap_or_else(|| FieldValue::empty_for(field.kind));
                (field.name.clone(), value)
            })
            .collect()
    }

    /// Record seeded from a JSON object, coercing each entry by its field's
    /// kind. Unknown keys and entries whose shape does not fit are ignored.
    pub fn record_from_json(&self, initial: &Value) -> Record {
        self.fields()
            .map(|field| {
                let value = initial
                    .get(&field.name)
                    .and_then(|raw| FieldValue::from_json(field.kind, raw))
                    .unwrap_or_else(|| FieldValue::empty_for(field.kind));
                (field.name.clone(), value)
            })
            .collect()
    }
}
