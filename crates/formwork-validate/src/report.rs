use serde::Serialize;

use crate::issue::{Issue, Severity};

/// Synthetic key that record-level issues are reported under, alongside the
/// real field names.
pub const RECORD_KEY: &str = "__record__";

/// Validation report for one record.
///
/// Recomputed on every record change and discarded; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity() == Severity::Error)
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
            .count()
    }

    /// Report key an issue is filed under: its field name, or
    /// [`RECORD_KEY`] for record-level issues.
    pub fn key_of(issue: &Issue) -> &str {
        issue.field().unwrap_or(RECORD_KEY)
    }

    /// First blocking issue filed under the given key, if any.
    pub fn error_for(&self, key: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| {
            issue.severity() == Severity::Error && Self::key_of(issue) == key
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }
}
