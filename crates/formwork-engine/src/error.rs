use thiserror::Error;

/// Engine faults.
///
/// These indicate caller bugs, never data-level failures: a failing option
/// loader becomes an empty option list, a failing validation becomes report
/// data. Nothing the engine does can stop the render path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// An event referenced a field name the form definition does not contain.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// The form session's event loop has shut down.
    #[error("form session closed")]
    SessionClosed,
}

impl EngineError {
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }
}
