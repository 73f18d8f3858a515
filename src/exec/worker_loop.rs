// src/exec/worker_loop.rs

//! Background loop that manages one worker process per running job.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{DispatchedJob, RuntimeEvent};
use crate::exec::job_runner::run_job;
use crate::exec::protocol::LineParser;
use crate::types::RecordId;

/// Instruction sent from the runtime to the worker loop.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Start(DispatchedJob),
    Abort(RecordId),
}

/// Internal handle for a job's process.
///
/// - `cancel` asks the runner to kill the process.
/// - `handle` is the Tokio task running it.
struct ActiveJob {
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background worker loop.
///
/// Each started job runs in its own Tokio task; a record id never has more
/// than one live process. Duplicate starts for a live record are ignored.
pub fn spawn_worker(
    cmd: String,
    parser: LineParser,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<WorkerCommand> {
    let (tx, mut rx) = mpsc::channel::<WorkerCommand>(32);

    tokio::spawn(async move {
        info!(cmd = %cmd, "worker loop started");

        let mut active: HashMap<RecordId, ActiveJob> = HashMap::new();

        while let Some(command) = rx.recv().await {
            active.retain(|_, job| !job.handle.is_finished());

            match command {
                WorkerCommand::Start(job) => {
                    start_job(&cmd, &parser, job, &mut active, &runtime_tx);
                }
                WorkerCommand::Abort(record_id) => abort_job(&record_id, &mut active),
            }
        }

        info!("worker loop finished (channel closed)");
    });

    tx
}

fn start_job(
    cmd: &str,
    parser: &LineParser,
    job: DispatchedJob,
    active: &mut HashMap<RecordId, ActiveJob>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    if active.contains_key(&job.record_id) {
        warn!(
            sequence_id = job.sequence_id,
            record_id = %job.record_id,
            "job already has a live process; ignoring duplicate start"
        );
        return;
    }

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let record_id = job.record_id.clone();
    let rt_tx = runtime_tx.clone();
    let cmd = cmd.to_string();
    let parser = parser.clone();

    let handle = tokio::spawn(async move {
        let sequence_id = job.sequence_id;
        run_job(cmd, parser, job, rt_tx, cancel_rx).await;
        debug!(sequence_id, "job runner future finished");
    });

    active.insert(
        record_id,
        ActiveJob {
            cancel: Some(cancel_tx),
            handle,
        },
    );
}

fn abort_job(record_id: &str, active: &mut HashMap<RecordId, ActiveJob>) {
    let Some(mut job) = active.remove(record_id) else {
        debug!(record_id, "abort for job without live process; ignoring");
        return;
    };

    info!(record_id, "aborting job process");
    if let Some(cancel) = job.cancel.take() {
        if cancel.send(()).is_err() {
            debug!(record_id, "process already finished while aborting");
        }
    }
}
