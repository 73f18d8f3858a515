// src/scheduler/snapshot.rs

//! Persisted subset of scheduler state.
//!
//! The job list is stored as a versioned JSON envelope. Only
//! scheduling-relevant fields are written; the full result payload stays in
//! memory.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ForgeqError, Result};
use crate::scheduler::job::{clamp_progress, JobRecord};
use crate::types::{JobStatus, Priority, RecordId, SequenceId};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedJob {
    pub sequence_id: SequenceId,
    pub record_id: RecordId,
    pub title: String,
    pub status: JobStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_sequence_id: Option<SequenceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&JobRecord> for PersistedJob {
    fn from(job: &JobRecord) -> Self {
        Self {
            sequence_id: job.sequence_id,
            record_id: job.record_id.clone(),
            title: job.title.clone(),
            status: job.status,
            priority: job.priority,
            parent_sequence_id: job.parent_sequence_id,
            current_stage: job.current_stage.clone(),
            progress: job.progress,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            score: job.score,
            strategy_used: job.strategy_used.clone(),
            result_reference: job.result_reference.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

impl From<PersistedJob> for JobRecord {
    fn from(snap: PersistedJob) -> Self {
        // completed_at is meaningful iff the status is terminal.
        let completed_at = if snap.status.is_terminal() {
            Some(snap.completed_at.unwrap_or(snap.created_at))
        } else {
            None
        };

        Self {
            sequence_id: snap.sequence_id,
            record_id: snap.record_id,
            title: snap.title,
            status: snap.status,
            priority: snap.priority,
            parent_sequence_id: snap.parent_sequence_id,
            current_stage: snap.current_stage,
            progress: clamp_progress(snap.progress),
            created_at: snap.created_at,
            started_at: snap.started_at,
            completed_at,
            score: snap.score,
            strategy_used: snap.strategy_used,
            result_reference: snap.result_reference,
            result_payload: None,
            error_message: snap.error_message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsSnapshot {
    pub version: u32,
    pub next_sequence_id: SequenceId,
    pub jobs: Vec<PersistedJob>,
}

/// State recovered from a snapshot.
#[derive(Debug, Clone)]
pub struct RestoredJobs {
    pub jobs: Vec<JobRecord>,
    pub next_sequence_id: SequenceId,
}

pub fn encode_jobs(jobs: &[JobRecord], next_sequence_id: SequenceId) -> Result<String> {
    let snapshot = JobsSnapshot {
        version: SNAPSHOT_VERSION,
        next_sequence_id,
        jobs: jobs.iter().map(PersistedJob::from).collect(),
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Decode a jobs snapshot.
///
/// Records are re-sorted by sequence id; records repeating an already seen
/// sequence id or record id are dropped. The returned `next_sequence_id` is
/// always greater than every restored sequence id.
pub fn decode_jobs(raw: &str) -> Result<RestoredJobs> {
    let snapshot: JobsSnapshot = serde_json::from_str(raw)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(ForgeqError::InvalidSnapshot(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    let mut persisted = snapshot.jobs;
    persisted.sort_by_key(|j| j.sequence_id);

    let mut seen_seq = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut jobs = Vec::with_capacity(persisted.len());

    for job in persisted {
        if !seen_seq.insert(job.sequence_id) || !seen_ids.insert(job.record_id.clone()) {
            warn!(
                sequence_id = job.sequence_id,
                record_id = %job.record_id,
                "duplicate job in snapshot; dropping"
            );
            continue;
        }
        jobs.push(JobRecord::from(job));
    }

    let after_last = jobs.last().map(|j| j.sequence_id + 1).unwrap_or(1);
    let next_sequence_id = snapshot.next_sequence_id.max(after_last).max(1);

    Ok(RestoredJobs {
        jobs,
        next_sequence_id,
    })
}
