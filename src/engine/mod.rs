// src/engine/mod.rs

//! Orchestration engine for forgeq.
//!
//! This module ties together:
//! - the forge scheduler
//! - the worker that performs running jobs
//! - the main runtime event loop that reacts to:
//!   - submissions and operator commands (cancel, dismiss, promote, retry)
//!   - worker progress / completion / failure callbacks
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. The runtime loop is the scheduler's only
//! owner, so every operation runs to completion before the next starts.

use crate::scheduler::{JobOutcome, JobRecord};
use crate::types::{Priority, RecordId, SequenceId};

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit the runtime once nothing is running or queued (`run --once`).
    pub exit_when_idle: bool,
}

/// A job that just entered `running` and must be handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedJob {
    pub record_id: RecordId,
    pub sequence_id: SequenceId,
    pub title: String,
    pub priority: Priority,
}

impl DispatchedJob {
    pub fn from_record(job: &JobRecord) -> Self {
        Self {
            record_id: job.record_id.clone(),
            sequence_id: job.sequence_id,
            title: job.title.clone(),
            priority: job.priority,
        }
    }
}

/// Events flowing into the runtime from the CLI, the worker, signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Submit {
        title: String,
        priority: Option<Priority>,
        parent: Option<SequenceId>,
    },
    Progress {
        record_id: RecordId,
        stage: String,
        progress: f64,
    },
    Completed {
        record_id: RecordId,
        outcome: JobOutcome,
    },
    Failed {
        record_id: RecordId,
        message: String,
    },
    Cancel {
        sequence_id: SequenceId,
    },
    Dismiss {
        sequence_id: SequenceId,
    },
    Promote {
        sequence_id: SequenceId,
    },
    Retry {
        sequence_id: SequenceId,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
