// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::HashSet;

use crate::engine::{DispatchedJob, RuntimeOptions};
use crate::scheduler::Scheduler;
use crate::types::{JobStatus, RecordId, SequenceId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// Hand these newly running jobs to the worker.
    Dispatch(Vec<DispatchedJob>),
    /// Stop external work for these cancelled jobs.
    Abort(Vec<RecordId>),
    /// Request that the process exits (used for `--once` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Apply `op` to the scheduler and report every job that entered `running`
/// as a result (direct admission or promotion).
pub fn with_dispatch<F>(scheduler: &mut Scheduler, op: F) -> Vec<CoreCommand>
where
    F: FnOnce(&mut Scheduler),
{
    let before: HashSet<RecordId> = scheduler
        .running()
        .into_iter()
        .map(|j| j.record_id.clone())
        .collect();

    op(scheduler);

    let started: Vec<DispatchedJob> = scheduler
        .running()
        .into_iter()
        .filter(|j| !before.contains(&j.record_id))
        .map(DispatchedJob::from_record)
        .collect();

    if started.is_empty() {
        Vec::new()
    } else {
        vec![CoreCommand::Dispatch(started)]
    }
}

/// Handle a cancel request.
///
/// A running job that got cancelled needs its external work aborted; the
/// freed slot may also start a queued job.
pub fn handle_cancel(scheduler: &mut Scheduler, sequence_id: SequenceId) -> Vec<CoreCommand> {
    let was_running = scheduler
        .job_by_sequence(sequence_id)
        .filter(|j| j.status == JobStatus::Running)
        .map(|j| j.record_id.clone());

    let mut commands = Vec::new();
    let mut dispatch = with_dispatch(scheduler, |s| s.cancel(sequence_id));

    if let Some(record_id) = was_running {
        let cancelled = scheduler
            .job(&record_id)
            .is_some_and(|j| j.status == JobStatus::Cancelled);
        if cancelled {
            commands.push(CoreCommand::Abort(vec![record_id]));
        }
    }

    commands.append(&mut dispatch);
    commands
}

/// Append `RequestExit` when running in `--once` mode and nothing is left.
pub fn maybe_request_exit(
    scheduler: &Scheduler,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    let idle = scheduler.running().is_empty() && scheduler.queue().is_empty();
    if options.exit_when_idle && idle {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }
    CoreStep::continue_with(commands)
}
