// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::DispatchedJob;
use crate::errors::Result;
use crate::exec::WorkerBackend;
use crate::scheduler::Scheduler;
use crate::types::RecordId;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s and delegates the
/// actual forge work to a `WorkerBackend`.
///
/// This is a pure IO shell around `CoreRuntime`: it reads events from a
/// single channel (so scheduler operations never interleave) and executes
/// the commands the core returns.
pub struct Runtime<W: WorkerBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    worker: W,
}

impl<W: WorkerBackend> fmt::Debug for Runtime<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<W: WorkerBackend> Runtime<W> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, worker: W) -> Self {
        Self {
            core,
            event_rx,
            worker,
        }
    }

    /// Main event loop.
    ///
    /// - Re-dispatches jobs that were restored in `running`.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them to the core.
    /// - Executes the returned commands (dispatch, abort, exit).
    ///
    /// Returns the scheduler so callers can inspect the final state.
    pub async fn run(mut self) -> Result<Scheduler> {
        info!("forgeq runtime started");

        let resume = self.core.resume();
        if !self.apply(resume).await? {
            info!("nothing to do; stopping runtime");
            return Ok(self.core.into_scheduler());
        }

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            if !self.apply(step).await? {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core.into_scheduler())
    }

    /// Execute a step's commands; returns whether to keep running.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(jobs) => self.dispatch(jobs).await?,
            CoreCommand::Abort(record_ids) => self.abort(record_ids).await?,
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, jobs: Vec<DispatchedJob>) -> Result<()> {
        if jobs.is_empty() {
            return Ok(());
        }

        let sequence_ids: Vec<_> = jobs.iter().map(|j| j.sequence_id).collect();
        debug!(?sequence_ids, "dispatching jobs to worker");

        self.worker.dispatch(jobs).await
    }

    async fn abort(&mut self, record_ids: Vec<RecordId>) -> Result<()> {
        if record_ids.is_empty() {
            return Ok(());
        }
        debug!(?record_ids, "aborting cancelled jobs");
        self.worker.abort(record_ids).await
    }
}
