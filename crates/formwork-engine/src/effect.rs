//! Effects emitted by the form controller.

use formwork_model::{FieldValue, Record};
use formwork_validate::ValidationReport;

/// An inert command produced by applying an event.
///
/// The controller never performs IO; the session driver (or an embedding
/// host running its own loop) executes these and feeds completions back in
/// as events.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Invoke the field's option loader with the given dependency value
    /// and deliver the result as [`FormEvent::OptionsLoaded`] carrying
    /// `token`.
    ///
    /// [`FormEvent::OptionsLoaded`]: crate::event::FormEvent::OptionsLoaded
    LoadOptions {
        field: String,
        token: u64,
        dependency: Option<FieldValue>,
    },
    /// The record settled into a new state; `serialized` is its JSON
    /// mirror. Fired once per settled batch, regardless of validity.
    NotifyRecordChanged { serialized: String },
    /// A field's option load failed; its options are now empty.
    NotifyLoadFailed { field: String, error: String },
    /// Validation passed; forward the record to the external submit
    /// handler exactly once.
    ForwardSubmit { record: Record },
    /// Submission was refused by validation; no side effects were run.
    NotifySubmitRejected { report: ValidationReport },
}
