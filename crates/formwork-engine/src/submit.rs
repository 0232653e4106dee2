/// Idempotency latch for the submission pipeline.
///
/// A submit that passes validation closes the gate until the external
/// handler settles; repeat submit requests while it is closed produce no
/// effects. Settling reopens it whether the handler succeeded or failed,
/// so a failed submission can be retried.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SubmitGate {
    in_flight: bool,
}

impl SubmitGate {
    /// Close the gate for a new forward. Returns false if one is already
    /// outstanding.
    pub(crate) fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub(crate) fn settle(&mut self) {
        self.in_flight = false;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.in_flight
    }
}
