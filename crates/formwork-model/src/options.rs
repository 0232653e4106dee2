//! Option lists and the asynchronous option-source collaborator.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// One selectable option: a submission value plus its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label equals its value.
    pub fn from_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

impl fmt::Display for OptionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Asynchronous option source supplied by the schema author.
///
/// `dependency` is the current value of the watched field, or `None` for a
/// global load with no dependency. Failures are caught at this boundary by
/// the engine and converted into an empty option list; they never reach the
/// render path.
#[async_trait]
pub trait OptionLoader: Send + Sync {
    async fn load(&self, dependency: Option<&FieldValue>) -> anyhow::Result<Vec<OptionItem>>;
}

/// Where a field's selectable options come from.
#[derive(Clone, Default)]
pub enum OptionSource {
    /// The field has no option list (free-form input).
    #[default]
    None,
    /// Fixed list carried on the field spec.
    Static(Vec<OptionItem>),
    /// Loaded asynchronously, re-issued when the watched dependency changes.
    Loader(Arc<dyn OptionLoader>),
}

impl OptionSource {
    pub fn is_async(&self) -> bool {
        matches!(self, OptionSource::Loader(_))
    }

    /// The fixed list, if this source is static.
    pub fn static_items(&self) -> Option<&[OptionItem]> {
        match self {
            OptionSource::Static(items) => Some(items),
            _ => None,
        }
    }

    pub fn loader(&self) -> Option<&Arc<dyn OptionLoader>> {
        match self {
            OptionSource::Loader(loader) => Some(loader),
            _ => None,
        }
    }
}

impl fmt::Debug for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSource::None => write!(f, "None"),
            OptionSource::Static(items) => f.debug_tuple("Static").field(items).finish(),
            OptionSource::Loader(_) => write!(f, "Loader(..)"),
        }
    }
}
