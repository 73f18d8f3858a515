// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and produces an updated scheduler plus a list
//! of commands describing what the IO shell should do next (dispatch jobs to
//! the worker, abort cancelled work, exit).
//!
//! No Tokio, channels or processes here; the core is unit tested directly.

use crate::engine::event_handlers::{handle_cancel, maybe_request_exit, with_dispatch, CoreStep};
use crate::engine::{CoreCommand, DispatchedJob, RuntimeEvent, RuntimeOptions};
use crate::scheduler::Scheduler;

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self { scheduler, options }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }

    /// Commands for jobs that were already `running` when the core was built
    /// (restored from a snapshot): their worker must be re-attached.
    pub fn resume(&mut self) -> CoreStep {
        let running: Vec<DispatchedJob> = self
            .scheduler
            .running()
            .into_iter()
            .map(DispatchedJob::from_record)
            .collect();

        let commands = if running.is_empty() {
            Vec::new()
        } else {
            vec![CoreCommand::Dispatch(running)]
        };
        maybe_request_exit(&self.scheduler, &self.options, commands)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let s = &mut self.scheduler;
        let commands = match event {
            RuntimeEvent::Submit {
                title,
                priority,
                parent,
            } => with_dispatch(s, |s| {
                s.admit(title, priority, parent);
            }),
            RuntimeEvent::Progress {
                record_id,
                stage,
                progress,
            } => {
                s.update_progress(&record_id, stage, progress);
                Vec::new()
            }
            RuntimeEvent::Completed { record_id, outcome } => {
                with_dispatch(s, |s| s.complete(&record_id, outcome))
            }
            RuntimeEvent::Failed { record_id, message } => {
                with_dispatch(s, |s| s.fail(&record_id, message))
            }
            RuntimeEvent::Cancel { sequence_id } => handle_cancel(s, sequence_id),
            RuntimeEvent::Dismiss { sequence_id } => {
                s.dismiss(sequence_id);
                Vec::new()
            }
            RuntimeEvent::Promote { sequence_id } => {
                s.promote(sequence_id);
                Vec::new()
            }
            RuntimeEvent::Retry { sequence_id } => with_dispatch(s, |s| {
                s.retry(sequence_id);
            }),
            RuntimeEvent::ShutdownRequested => {
                return CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                };
            }
        };

        maybe_request_exit(&self.scheduler, &self.options, commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullNotifier;
    use crate::scheduler::{JobOutcome, SchedulerOptions};
    use crate::store::MemoryStore;
    use crate::types::Priority;

    fn core(max_concurrent: usize, exit_when_idle: bool) -> CoreRuntime {
        let scheduler = Scheduler::new(
            SchedulerOptions {
                max_concurrent,
                ..SchedulerOptions::default()
            },
            Box::new(MemoryStore::new()),
            Box::new(NullNotifier),
        );
        CoreRuntime::new(scheduler, RuntimeOptions { exit_when_idle })
    }

    fn submit(title: &str, priority: Priority) -> RuntimeEvent {
        RuntimeEvent::Submit {
            title: title.to_string(),
            priority: Some(priority),
            parent: None,
        }
    }

    fn dispatched_titles(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Dispatch(jobs) => Some(jobs.iter().map(|j| j.title.clone())),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn direct_admission_dispatches_and_queued_does_not() {
        let mut core = core(1, false);

        let first = core.step(submit("a", Priority::Interactive));
        let second = core.step(submit("b", Priority::Interactive));

        assert_eq!(dispatched_titles(&first), vec!["a"]);
        assert!(second.commands.is_empty());
        assert!(second.keep_running);
    }

    #[test]
    fn completion_dispatches_promoted_job() {
        let mut core = core(1, false);
        core.step(submit("a", Priority::Interactive));
        core.step(submit("b", Priority::Batch));
        core.step(submit("c", Priority::Interactive));
        let a = core.scheduler().jobs()[0].record_id.clone();

        let step = core.step(RuntimeEvent::Completed {
            record_id: a,
            outcome: JobOutcome::default(),
        });

        assert_eq!(dispatched_titles(&step), vec!["c"]);
    }

    #[test]
    fn cancelling_running_job_aborts_then_dispatches() {
        let mut core = core(1, false);
        core.step(submit("a", Priority::Interactive));
        core.step(submit("b", Priority::Interactive));
        let a = core.scheduler().jobs()[0].record_id.clone();

        let step = core.step(RuntimeEvent::Cancel { sequence_id: 1 });

        assert_eq!(step.commands[0], CoreCommand::Abort(vec![a]));
        assert_eq!(dispatched_titles(&step), vec!["b"]);
    }

    #[test]
    fn cancelling_queued_job_aborts_nothing() {
        let mut core = core(1, false);
        core.step(submit("a", Priority::Interactive));
        core.step(submit("b", Priority::Interactive));

        let step = core.step(RuntimeEvent::Cancel { sequence_id: 2 });

        assert!(step.commands.is_empty());
    }

    #[test]
    fn once_mode_exits_when_idle() {
        let mut core = core(1, true);
        let step = core.step(submit("a", Priority::Interactive));
        assert!(step.keep_running);

        let a = core.scheduler().jobs()[0].record_id.clone();
        let step = core.step(RuntimeEvent::Failed {
            record_id: a,
            message: "boom".into(),
        });

        assert!(!step.keep_running);
        assert_eq!(step.commands.last(), Some(&CoreCommand::RequestExit));
    }

    #[test]
    fn resume_redispatches_running_jobs() {
        let mut core = core(2, false);
        core.step(submit("a", Priority::Interactive));
        core.step(submit("b", Priority::Interactive));

        let step = core.resume();

        assert_eq!(dispatched_titles(&step), vec!["a", "b"]);
    }

    #[test]
    fn shutdown_stops_loop() {
        let mut core = core(1, false);
        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert!(step.commands.is_empty());
    }
}
