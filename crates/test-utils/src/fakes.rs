use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::mpsc;

use forgeq::engine::{DispatchedJob, RuntimeEvent};
use forgeq::errors::Result;
use forgeq::events::{EventNotifier, LifecycleEvent};
use forgeq::exec::WorkerBackend;
use forgeq::scheduler::JobOutcome;
use forgeq::store::SnapshotStore;
use forgeq::types::{EventKind, RecordId, SequenceId};

/// Notifier that keeps every event it receives. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(kind, sequence_id)` pairs, in emission order.
    pub fn kinds(&self) -> Vec<(EventKind, SequenceId)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.kind, e.payload.sequence_id))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventNotifier for RecordingNotifier {
    fn emit(&self, event: LifecycleEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Store whose every call fails. Counts write attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    writes: Arc<Mutex<usize>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_attempts(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl SnapshotStore for FailingStore {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow!("store unavailable"))
    }

    fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
        *self.writes.lock().unwrap() += 1;
        Err(anyhow!("quota exceeded"))
    }

    fn remove(&mut self, _key: &str) -> anyhow::Result<()> {
        Err(anyhow!("store unavailable"))
    }
}

/// How the fake worker finishes each dispatched job.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Report `Completed` with this score.
    Complete(f64),
    /// Report `Failed` with this message.
    Fail(String),
    /// Never report anything (job stays running until cancelled).
    Hang,
}

/// A fake worker that:
/// - records which jobs were dispatched / aborted
/// - immediately reports an outcome for each dispatched job.
pub struct FakeWorker {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    outcome: FakeOutcome,
    dispatched: Arc<Mutex<Vec<DispatchedJob>>>,
    aborted: Arc<Mutex<Vec<RecordId>>>,
}

impl FakeWorker {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, outcome: FakeOutcome) -> Self {
        Self {
            runtime_tx,
            outcome,
            dispatched: Arc::new(Mutex::new(Vec::new())),
            aborted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the dispatch log; readable after the worker moved
    /// into the runtime.
    pub fn dispatched(&self) -> Arc<Mutex<Vec<DispatchedJob>>> {
        Arc::clone(&self.dispatched)
    }

    pub fn aborted(&self) -> Arc<Mutex<Vec<RecordId>>> {
        Arc::clone(&self.aborted)
    }
}

impl WorkerBackend for FakeWorker {
    fn dispatch(
        &mut self,
        jobs: Vec<DispatchedJob>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let outcome = self.outcome.clone();

        Box::pin(async move {
            for job in jobs {
                {
                    let mut guard = dispatched.lock().unwrap();
                    guard.push(job.clone());
                }

                let event = match &outcome {
                    FakeOutcome::Complete(score) => RuntimeEvent::Completed {
                        record_id: job.record_id.clone(),
                        outcome: JobOutcome {
                            score: Some(*score),
                            ..JobOutcome::default()
                        },
                    },
                    FakeOutcome::Fail(message) => RuntimeEvent::Failed {
                        record_id: job.record_id.clone(),
                        message: message.clone(),
                    },
                    FakeOutcome::Hang => continue,
                };

                // Sent from a separate task: the runtime is blocked on this
                // future, so a full channel must not deadlock it.
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(event).await;
                });
            }
            Ok(())
        })
    }

    fn abort(
        &mut self,
        record_ids: Vec<RecordId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let aborted = Arc::clone(&self.aborted);

        Box::pin(async move {
            aborted.lock().unwrap().extend(record_ids);
            Ok(())
        })
    }
}
