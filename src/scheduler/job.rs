// src/scheduler/job.rs

//! Job record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{JobStatus, Priority, RecordId, SequenceId};

/// Result fields reported by the worker when a forge finishes successfully.
///
/// Every field is optional; only fields that are `Some` overwrite the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<String>,
    /// Correlation id of the full result stored elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_reference: Option<String>,
    /// Full result body. Kept in memory only; never persisted in snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// One unit of trackable work (a "forge").
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub sequence_id: SequenceId,
    pub record_id: RecordId,
    pub title: String,
    pub status: JobStatus,
    pub priority: Priority,
    /// Back-reference to the job this one retries. Never an ownership edge.
    pub parent_sequence_id: Option<SequenceId>,
    pub current_stage: Option<String>,
    /// Always within `[0, 1]`.
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Set exactly once, on entering a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub strategy_used: Option<String>,
    pub result_reference: Option<String>,
    pub result_payload: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

impl JobRecord {
    /// Fresh `queued` record with a newly generated record id.
    pub fn new(
        sequence_id: SequenceId,
        title: String,
        priority: Priority,
        parent_sequence_id: Option<SequenceId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence_id,
            record_id: Uuid::new_v4().to_string(),
            title,
            status: JobStatus::Queued,
            priority,
            parent_sequence_id,
            current_stage: None,
            progress: 0.0,
            created_at: now,
            started_at: None,
            completed_at: None,
            score: None,
            strategy_used: None,
            result_reference: None,
            result_payload: None,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `queued -> running`.
    pub(crate) fn start(&mut self, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, JobStatus::Queued);
        self.status = JobStatus::Running;
        self.started_at = Some(now);
    }

    /// Enter `terminal`. Callers must have checked the record is not terminal.
    pub(crate) fn finish(&mut self, terminal: JobStatus, now: DateTime<Utc>) {
        debug_assert!(terminal.is_terminal());
        debug_assert!(!self.is_terminal());
        self.status = terminal;
        self.completed_at = Some(now);
    }

    pub(crate) fn apply_outcome(&mut self, outcome: JobOutcome) {
        // Non-finite scores cannot be persisted.
        if let Some(score) = outcome.score.filter(|s| s.is_finite()) {
            self.score = Some(score);
        }
        if outcome.strategy_used.is_some() {
            self.strategy_used = outcome.strategy_used;
        }
        if outcome.result_reference.is_some() {
            self.result_reference = outcome.result_reference;
        }
        if outcome.payload.is_some() {
            self.result_payload = outcome.payload;
        }
    }

    pub(crate) fn set_progress(&mut self, stage: String, progress: f64) {
        self.current_stage = Some(stage);
        self.progress = clamp_progress(progress);
    }
}

/// Clamp to `[0, 1]`; NaN maps to `0.0`.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}
