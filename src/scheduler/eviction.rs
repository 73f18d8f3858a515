// src/scheduler/eviction.rs

//! Retention bound.
//!
//! After an admission pushes the record count above `max_retained`, the
//! single oldest terminal record is dropped. Active work is never evicted;
//! if nothing is terminal the bound stays exceeded until a later admission.

use tracing::{debug, info};

use crate::scheduler::job::JobRecord;

/// Index of the earliest-created record in a terminal state.
pub fn oldest_terminal(jobs: &[JobRecord]) -> Option<usize> {
    jobs.iter().position(JobRecord::is_terminal)
}

/// Remove at most one record if `jobs.len() > max_retained`.
pub fn evict_if_over_capacity(
    jobs: &mut Vec<JobRecord>,
    max_retained: usize,
) -> Option<JobRecord> {
    if jobs.len() <= max_retained {
        return None;
    }

    match oldest_terminal(jobs) {
        Some(idx) => {
            let evicted = jobs.remove(idx);
            info!(
                sequence_id = evicted.sequence_id,
                status = %evicted.status,
                retained = jobs.len(),
                max_retained,
                "evicted oldest terminal job"
            );
            Some(evicted)
        }
        None => {
            debug!(
                retained = jobs.len(),
                max_retained,
                "retention bound exceeded but no terminal job to evict"
            );
            None
        }
    }
}
