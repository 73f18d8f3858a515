// src/scheduler/mod.rs

//! Forge process scheduler.
//!
//! - [`job`] holds the job record model and terminal outcome fields.
//! - [`queue`] decides promotion order and fills free running slots.
//! - [`eviction`] bounds the number of retained records.
//! - [`snapshot`] encodes/decodes the persisted subset of scheduler state.
//! - [`core`] owns the state and exposes the public operations.

pub mod core;
pub mod eviction;
pub mod job;
pub mod queue;
pub mod snapshot;

pub use self::core::{Scheduler, SchedulerOptions};
pub use job::{JobOutcome, JobRecord};
