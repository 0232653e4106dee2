//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Policy for cyclic `depends_on` chains discovered at graph build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CyclePolicy {
    /// Sever every link on a cycle and report a schema issue. Severed
    /// fields keep their values but never trigger loads.
    #[default]
    Reject,
    /// Leave cyclic chains in place; load behavior on them is undefined.
    Unchecked,
}

/// When a field's validation error becomes visible in its view.
///
/// Validation itself runs on every record change regardless; this gates
/// what the rendering collaborator is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorVisibility {
    /// After the field has lost focus once, or a submit was attempted.
    #[default]
    AfterTouch,
    /// Immediately.
    Always,
}

/// Options controlling engine behavior.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    pub cycle_policy: CyclePolicy,
    pub error_visibility: ErrorVisibility,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn with_error_visibility(mut self, visibility: ErrorVisibility) -> Self {
        self.error_visibility = visibility;
        self
    }
}
