//! Events processed by the form controller.

use formwork_model::{FieldValue, OptionItem, Record};

/// One discrete event on the form's single logical thread of control.
///
/// User actions, externally supplied values, and asynchronous completions
/// all arrive through this type; the controller never mutates state on any
/// other path. Completion variants carry stringified errors so events stay
/// cheap to clone.
#[derive(Debug, Clone)]
pub enum FormEvent {
    // ========================================================================
    // External inputs
    // ========================================================================
    /// A new initial-values object arrived from the embedding host.
    /// Triggers a hard reset only when it genuinely differs from the last
    /// applied one.
    ValuesSupplied(Record),
    /// User asked to reset the form to the last applied initial values.
    ResetRequested,
    /// User edited a field.
    FieldChanged { field: String, value: FieldValue },
    /// A field lost focus.
    FieldBlurred { field: String },
    /// Re-run the global option loads (sources with no dependency).
    ReloadRequested,
    /// User triggered submission.
    SubmitRequested,

    // ========================================================================
    // Completions
    // ========================================================================
    /// An option load finished. `token` is the issue-sequence stamp the
    /// load was issued with; stale tokens are discarded at commit.
    OptionsLoaded {
        field: String,
        token: u64,
        result: Result<Vec<OptionItem>, String>,
    },
    /// The external submit handler finished.
    SubmitSettled { outcome: Result<(), String> },
}

impl FormEvent {
    pub fn changed(field: impl Into<String>, value: FieldValue) -> Self {
        Self::FieldChanged {
            field: field.into(),
            value,
        }
    }

    pub fn blurred(field: impl Into<String>) -> Self {
        Self::FieldBlurred {
            field: field.into(),
        }
    }
}
