// src/scheduler/queue.rs

//! Promotion order and slot filling.
//!
//! `jobs` is always in creation order, so "FIFO within a priority class" is
//! simply index order.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::scheduler::job::JobRecord;
use crate::types::JobStatus;

pub fn running_count(jobs: &[JobRecord]) -> usize {
    jobs.iter().filter(|j| j.status == JobStatus::Running).count()
}

/// Indices of queued jobs in the order they would be promoted:
/// interactive before batch, then creation order.
pub fn promotion_order(jobs: &[JobRecord]) -> Vec<usize> {
    let mut queued: Vec<usize> = jobs
        .iter()
        .enumerate()
        .filter(|(_, j)| j.status == JobStatus::Queued)
        .map(|(i, _)| i)
        .collect();

    // Stable sort keeps creation order inside each class.
    queued.sort_by_key(|&i| jobs[i].priority.rank());
    queued
}

/// Index of the queued job that should take the next free slot.
pub fn next_candidate(jobs: &[JobRecord]) -> Option<usize> {
    jobs.iter()
        .enumerate()
        .filter(|(_, j)| j.status == JobStatus::Queued)
        .min_by_key(|(i, j)| (j.priority.rank(), *i))
        .map(|(i, _)| i)
}

/// Move queued jobs to `running` while a slot is free.
///
/// Returns the indices that were started, in start order.
pub fn fill_free_slots(
    jobs: &mut [JobRecord],
    max_concurrent: usize,
    now: DateTime<Utc>,
) -> Vec<usize> {
    let mut started = Vec::new();
    let mut running = running_count(jobs);

    while running < max_concurrent {
        let Some(idx) = next_candidate(jobs) else {
            break;
        };
        let job = &mut jobs[idx];
        job.start(now);
        running += 1;

        info!(
            sequence_id = job.sequence_id,
            record_id = %job.record_id,
            priority = %job.priority,
            running,
            max_concurrent,
            "promoted queued job to running"
        );
        started.push(idx);
    }

    started
}
