//! Async session driver.
//!
//! Wraps a [`FormController`] in a single event loop task. Option loaders
//! and the submit handler run as spawned tasks that report back through
//! the same event channel, so the controller only ever sees one event at
//! a time and every interleaving is resolved by the issue-token check.
//!
//! Shutdown is channel-driven: the loop holds a weak sender, so it ends
//! once the last [`FormHandle`] and every in-flight completion task are
//! gone.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use formwork_model::{FieldValue, OptionLoader, Record};
use formwork_validate::ValidationReport;
use tokio::sync::{mpsc, watch};

use crate::controller::{FormController, FormSnapshot};
use crate::effect::Effect;
use crate::error::EngineError;
use crate::event::FormEvent;

/// The application half of a form session.
///
/// Only [`submit`] is mandatory; the notification methods default to
/// no-ops so hosts implement exactly the callbacks they care about.
///
/// [`submit`]: FormHost::submit
#[async_trait]
pub trait FormHost: Send + Sync {
    /// Called once per settled batch whose record differs, with the
    /// record serialized to JSON.
    fn on_record_changed(&self, serialized: String) {
        let _ = serialized;
    }

    /// An option loader failed. The field already carries an empty
    /// committed list by the time this runs.
    fn on_load_failed(&self, field: &str, error: &str) {
        let _ = (field, error);
    }

    /// A submit request was refused by validation.
    fn on_submit_rejected(&self, report: &ValidationReport) {
        let _ = report;
    }

    /// Forward a validated record to its destination.
    async fn submit(&self, record: Record) -> anyhow::Result<()>;
}

/// Cloneable front door to a running session.
#[derive(Debug, Clone)]
pub struct FormHandle {
    events: mpsc::UnboundedSender<FormEvent>,
    snapshots: watch::Receiver<FormSnapshot>,
}

impl FormHandle {
    pub fn dispatch(&self, event: FormEvent) -> Result<(), EngineError> {
        self.events
            .send(event)
            .map_err(|_| EngineError::SessionClosed)
    }

    pub fn change(
        &self,
        field: impl Into<String>,
        value: FieldValue,
    ) -> Result<(), EngineError> {
        self.dispatch(FormEvent::changed(field, value))
    }

    pub fn blur(&self, field: impl Into<String>) -> Result<(), EngineError> {
        self.dispatch(FormEvent::blurred(field))
    }

    pub fn supply_values(&self, values: Record) -> Result<(), EngineError> {
        self.dispatch(FormEvent::ValuesSupplied(values))
    }

    pub fn reset(&self) -> Result<(), EngineError> {
        self.dispatch(FormEvent::ResetRequested)
    }

    pub fn reload(&self) -> Result<(), EngineError> {
        self.dispatch(FormEvent::ReloadRequested)
    }

    pub fn submit(&self) -> Result<(), EngineError> {
        self.dispatch(FormEvent::SubmitRequested)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> FormSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver for awaiting snapshot changes.
    pub fn watch(&self) -> watch::Receiver<FormSnapshot> {
        self.snapshots.clone()
    }
}

/// Event loop state. Owned by the spawned session task.
pub struct FormSession {
    controller: FormController,
    host: Arc<dyn FormHost>,
    loaders: BTreeMap<String, Arc<dyn OptionLoader>>,
    events: mpsc::UnboundedReceiver<FormEvent>,
    /// Weak so in-flight tasks, not the loop itself, keep the channel open.
    completions: mpsc::WeakUnboundedSender<FormEvent>,
    snapshots: watch::Sender<FormSnapshot>,
}

impl FormSession {
    /// Start the session task and return its handle.
    ///
    /// Global option loads are issued before the first event. Must be
    /// called from within a Tokio runtime.
    pub fn spawn(mut controller: FormController, host: Arc<dyn FormHost>) -> FormHandle {
        let loaders: BTreeMap<String, Arc<dyn OptionLoader>> = controller
            .definition()
            .fields()
            .filter_map(|spec| {
                spec.options
                    .loader()
                    .map(|loader| (spec.name.clone(), Arc::clone(loader)))
            })
            .collect();
        let start_effects = controller.start();

        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(controller.snapshot());
        let session = Self {
            controller,
            host,
            loaders,
            events: rx,
            completions: tx.downgrade(),
            snapshots,
        };
        tokio::spawn(async move {
            for effect in start_effects {
                session.execute(effect);
            }
            session.run().await;
        });

        FormHandle {
            events: tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.step(event);
        }
        tracing::debug!("form session loop finished");
    }

    /// One settled batch: apply the event, execute its effects, publish.
    fn step(&mut self, event: FormEvent) {
        let effects = match self.controller.apply(event) {
            Ok(effects) => effects,
            Err(error) => {
                tracing::error!(error = %error, "event rejected");
                return;
            }
        };
        for effect in effects {
            self.execute(effect);
        }
        self.publish();
    }

    fn publish(&self) {
        let next = self.controller.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn execute(&self, effect: Effect) {
        match effect {
            Effect::LoadOptions {
                field,
                token,
                dependency,
            } => self.spawn_load(field, token, dependency),
            Effect::NotifyRecordChanged { serialized } => {
                self.host.on_record_changed(serialized);
            }
            Effect::NotifyLoadFailed { field, error } => {
                self.host.on_load_failed(&field, &error);
            }
            Effect::ForwardSubmit { record } => self.spawn_submit(record),
            Effect::NotifySubmitRejected { report } => {
                self.host.on_submit_rejected(&report);
            }
        }
    }

    fn spawn_load(&self, field: String, token: u64, dependency: Option<FieldValue>) {
        let Some(loader) = self.loaders.get(&field).map(Arc::clone) else {
            tracing::warn!(field = %field, "load requested for a field without a loader");
            return;
        };
        let Some(events) = self.completions.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let result = loader
                .load(dependency.as_ref())
                .await
                .map_err(|e| e.to_string());
            let _ = events.send(FormEvent::OptionsLoaded {
                field,
                token,
                result,
            });
        });
    }

    fn spawn_submit(&self, record: Record) {
        let host = Arc::clone(&self.host);
        let Some(events) = self.completions.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let outcome = host.submit(record).await.map_err(|e| e.to_string());
            let _ = events.send(FormEvent::SubmitSettled { outcome });
        });
    }
}
