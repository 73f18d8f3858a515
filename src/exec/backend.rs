// src/exec/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The runtime talks to a `WorkerBackend` instead of a raw mpsc sender so
//! tests can replace process execution with a fake that records dispatches
//! and emits completion events directly.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::{DispatchedJob, RuntimeEvent};
use crate::errors::{Error, Result};
use crate::types::RecordId;

use super::protocol::LineParser;
use super::worker_loop::{spawn_worker, WorkerCommand};

/// Trait abstracting how running jobs are performed.
pub trait WorkerBackend: Send {
    /// Start work for jobs that just entered `running`.
    fn dispatch(
        &mut self,
        jobs: Vec<DispatchedJob>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop work for cancelled jobs. Aborted jobs report nothing back.
    fn abort(
        &mut self,
        record_ids: Vec<RecordId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production worker: runs `[worker].cmd` once per running job.
pub struct CommandWorker {
    tx: mpsc::Sender<WorkerCommand>,
}

impl CommandWorker {
    /// Spawn the background worker loop immediately.
    pub fn new(cmd: String, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Result<Self> {
        let parser = LineParser::new()?;
        let tx = spawn_worker(cmd, parser, runtime_tx);
        Ok(Self { tx })
    }
}

impl WorkerBackend for CommandWorker {
    fn dispatch(
        &mut self,
        jobs: Vec<DispatchedJob>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for job in jobs {
                tx.send(WorkerCommand::Start(job)).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }

    fn abort(
        &mut self,
        record_ids: Vec<RecordId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for record_id in record_ids {
                tx.send(WorkerCommand::Abort(record_id))
                    .await
                    .map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
