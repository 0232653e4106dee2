//! End-to-end tests of the async session driver: real spawned loader
//! tasks racing through the event channel, snapshot publication, and the
//! submit path against a slow host.
//!
//! Loaders are scripted: each load call surfaces as a request the test
//! answers explicitly, so completion order is under test control.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use formwork_engine::{
    EngineOptions, FormController, FormHandle, FormHost, FormSession, FormSnapshot, LoadState,
};
use formwork_model::{
    FieldKind, FieldSpec, FieldValue, FormDefinition, OptionItem, OptionLoader, OptionSource,
    Record,
};
use formwork_validate::{RuleSet, ValidationReport};
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(2);

type LoadCall = (
    Option<FieldValue>,
    oneshot::Sender<anyhow::Result<Vec<OptionItem>>>,
);

struct ScriptedLoader {
    requests: mpsc::UnboundedSender<LoadCall>,
}

#[async_trait]
impl OptionLoader for ScriptedLoader {
    async fn load(&self, dependency: Option<&FieldValue>) -> anyhow::Result<Vec<OptionItem>> {
        let (respond, result) = oneshot::channel();
        self.requests
            .send((dependency.cloned(), respond))
            .map_err(|_| anyhow::anyhow!("test driver dropped"))?;
        result
            .await
            .map_err(|_| anyhow::anyhow!("responder dropped"))?
    }
}

fn scripted_source() -> (OptionSource, mpsc::UnboundedReceiver<LoadCall>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        OptionSource::Loader(Arc::new(ScriptedLoader { requests: tx })),
        rx,
    )
}

struct RecordingHost {
    records: Mutex<Vec<String>>,
    rejections: AtomicUsize,
    submissions: AtomicUsize,
    /// Permits released by the test to let `submit` return.
    release: Semaphore,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            rejections: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl FormHost for RecordingHost {
    fn on_record_changed(&self, serialized: String) {
        self.records.lock().unwrap().push(serialized);
    }

    fn on_submit_rejected(&self, _report: &ValidationReport) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }

    async fn submit(&self, _record: Record) -> anyhow::Result<()> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.release.acquire().await?.forget();
        Ok(())
    }
}

/// Honors RUST_LOG when debugging a hanging test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn spawn_session(fields: Vec<FieldSpec>, host: Arc<RecordingHost>) -> FormHandle {
    init_tracing();
    let definition = FormDefinition::from_fields(fields);
    let schema = Arc::new(RuleSet::derive(&definition));
    let controller = FormController::new(definition, schema, EngineOptions::default());
    FormSession::spawn(controller, host)
}

fn choice(value: &str) -> FieldValue {
    FieldValue::choice(value, value)
}

fn items(values: &[&str]) -> Vec<OptionItem> {
    values.iter().map(|v| OptionItem::from_value(*v)).collect()
}

async fn wait_until(
    snapshots: &mut watch::Receiver<FormSnapshot>,
    predicate: impl Fn(&FormSnapshot) -> bool,
) -> FormSnapshot {
    let settled = async {
        loop {
            {
                let current = snapshots.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            if snapshots.changed().await.is_err() {
                panic!("session ended before the expected snapshot");
            }
        }
    };
    timeout(WAIT, settled)
        .await
        .expect("timed out waiting for snapshot")
}

#[tokio::test]
async fn global_options_load_at_startup() {
    let (source, mut requests) = scripted_source();
    let handle = spawn_session(
        vec![FieldSpec::new("country", FieldKind::Select).with_options(source)],
        Arc::new(RecordingHost::default()),
    );
    let mut snapshots = handle.watch();

    let (dependency, respond) = timeout(WAIT, requests.recv())
        .await
        .expect("no load request")
        .unwrap();
    assert_eq!(dependency, None);
    respond.send(Ok(items(&["US", "CA"]))).unwrap();

    let snapshot = wait_until(&mut snapshots, |s| {
        s.fields["country"].load_state == LoadState::Loaded
    })
    .await;
    assert_eq!(snapshot.fields["country"].options, items(&["US", "CA"]));
}

#[tokio::test]
async fn stale_loader_result_never_reaches_the_snapshot() {
    let (source, mut requests) = scripted_source();
    let handle = spawn_session(
        vec![
            FieldSpec::new("country", FieldKind::Select)
                .with_options(OptionSource::Static(items(&["US", "CA"]))),
            FieldSpec::new("region", FieldKind::Select)
                .with_dependency("country")
                .with_options(source),
        ],
        Arc::new(RecordingHost::default()),
    );
    let mut snapshots = handle.watch();

    handle.change("country", choice("US")).unwrap();
    let (dependency, respond_stale) = timeout(WAIT, requests.recv())
        .await
        .expect("no first request")
        .unwrap();
    assert_eq!(dependency, Some(choice("US")));

    handle.change("country", choice("CA")).unwrap();
    let (dependency, respond_fresh) = timeout(WAIT, requests.recv())
        .await
        .expect("no second request")
        .unwrap();
    assert_eq!(dependency, Some(choice("CA")));

    // The newer issue resolves first and commits.
    respond_fresh.send(Ok(items(&["ontario"]))).unwrap();
    let snapshot = wait_until(&mut snapshots, |s| {
        s.fields["region"].load_state == LoadState::Loaded
    })
    .await;
    assert_eq!(snapshot.fields["region"].options, items(&["ontario"]));

    // The older result lands afterwards and must change nothing.
    respond_stale.send(Ok(items(&["texas"]))).unwrap();
    let unchanged = timeout(Duration::from_millis(100), snapshots.changed()).await;
    assert!(unchanged.is_err(), "stale result produced a snapshot");
    assert_eq!(
        handle.snapshot().fields["region"].options,
        items(&["ontario"])
    );
}

#[tokio::test]
async fn record_notifications_follow_settled_batches() {
    let host = Arc::new(RecordingHost::default());
    let handle = spawn_session(
        vec![FieldSpec::new("notes", FieldKind::Text)],
        Arc::clone(&host),
    );
    let mut snapshots = handle.watch();

    handle.change("notes", FieldValue::text("first")).unwrap();
    handle.change("notes", FieldValue::text("second")).unwrap();

    wait_until(&mut snapshots, |s| {
        s.record.get("notes") == Some(&FieldValue::text("second"))
    })
    .await;

    let records = host.records.lock().unwrap();
    assert_eq!(records.len(), 2);
    let first: serde_json::Value = serde_json::from_str(&records[0]).unwrap();
    let second: serde_json::Value = serde_json::from_str(&records[1]).unwrap();
    assert_eq!(first["notes"], "first");
    assert_eq!(second["notes"], "second");
}

#[tokio::test]
async fn duplicate_submits_reach_the_host_once() {
    let host = Arc::new(RecordingHost::default());
    let handle = spawn_session(
        vec![
            FieldSpec::new("country", FieldKind::Select)
                .with_label("Country")
                .required()
                .with_options(OptionSource::Static(items(&["US"]))),
        ],
        Arc::clone(&host),
    );
    let mut snapshots = handle.watch();

    handle.change("country", choice("US")).unwrap();
    handle.submit().unwrap();
    wait_until(&mut snapshots, |s| s.submit_pending).await;

    // Repeat while the slow handler still holds the first forward.
    handle.submit().unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(host.submissions.load(Ordering::SeqCst), 1);

    host.release.add_permits(1);
    wait_until(&mut snapshots, |s| !s.submit_pending).await;

    handle.submit().unwrap();
    wait_until(&mut snapshots, |s| s.submit_pending).await;
    assert_eq!(host.submissions.load(Ordering::SeqCst), 2);
    host.release.add_permits(1);
}

#[tokio::test]
async fn invalid_record_never_reaches_the_host() {
    let host = Arc::new(RecordingHost::default());
    let handle = spawn_session(
        vec![
            FieldSpec::new("country", FieldKind::Select)
                .with_label("Country")
                .required()
                .with_options(OptionSource::Static(items(&["US"]))),
        ],
        Arc::clone(&host),
    );
    let mut snapshots = handle.watch();

    handle.submit().unwrap();
    let snapshot = wait_until(&mut snapshots, |s| {
        s.fields["country"].error.is_some()
    })
    .await;

    assert_eq!(
        snapshot.fields["country"].error.as_deref(),
        Some("Country is required")
    );
    assert_eq!(host.rejections.load(Ordering::SeqCst), 1);
    assert_eq!(host.submissions.load(Ordering::SeqCst), 0);
}
