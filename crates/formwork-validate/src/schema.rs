use formwork_model::Record;

use crate::report::ValidationReport;

/// The opaque validation contract the engine accepts.
///
/// Implementations must be pure with respect to the record: given the same
/// record, the same report. The engine re-invokes this on every record
/// change, so implementations should be cheap; failures are expressed as
/// issues in the report, never as panics.
pub trait RecordSchema: Send + Sync {
    fn validate(&self, record: &Record) -> ValidationReport;
}
