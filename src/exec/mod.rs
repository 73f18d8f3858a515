// src/exec/mod.rs

//! Worker layer: performs the forge for every job the scheduler runs.
//!
//! The scheduler only tracks admission and capacity; this module does the
//! long-running work and reports back through `RuntimeEvent`s.
//!
//! - [`backend`] provides the `WorkerBackend` trait and `CommandWorker`, the
//!   production implementation; tests swap in fakes.
//! - [`worker_loop`] owns the background loop that tracks one process per
//!   running job and handles aborts.
//! - [`job_runner`] runs a single job's process.
//! - [`protocol`] parses the worker command's stdout lines.

pub mod backend;
pub mod job_runner;
pub mod protocol;
pub mod worker_loop;

pub use backend::{CommandWorker, WorkerBackend};
pub use protocol::{LineParser, ProtocolLine};
pub use worker_loop::{spawn_worker, WorkerCommand};
