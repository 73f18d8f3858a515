// src/scheduler/core.rs

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::events::{EventNotifier, EventPayload, LifecycleEvent, SCHEDULER_SOURCE};
use crate::scheduler::eviction::evict_if_over_capacity;
use crate::scheduler::job::{JobOutcome, JobRecord};
use crate::scheduler::queue::{fill_free_slots, promotion_order, running_count};
use crate::scheduler::snapshot::{decode_jobs, encode_jobs};
use crate::store::SnapshotStore;
use crate::types::{EventKind, JobStatus, Priority, RecordId, SequenceId};

/// Capacity bounds and snapshot keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub max_concurrent: usize,
    pub max_retained: usize,
    pub jobs_key: String,
    pub active_key: String,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            max_retained: 10,
            jobs_key: "forgeq.jobs".to_string(),
            active_key: "forgeq.active".to_string(),
        }
    }
}

impl SchedulerOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            max_concurrent: cfg.scheduler.max_concurrent,
            max_retained: cfg.scheduler.max_retained,
            jobs_key: cfg.store.jobs_key.clone(),
            active_key: cfg.store.active_key.clone(),
        }
    }
}

/// The forge scheduler.
///
/// It is responsible for:
/// - assigning sequence ids and record ids on admission
/// - bounding concurrently running jobs and queueing the rest
/// - promoting queued jobs (interactive first, then FIFO) as slots free
/// - evicting the oldest terminal job once the retention bound is exceeded
/// - tracking which job is focused
/// - writing a snapshot after every mutation and emitting lifecycle events
///
/// Every operation is total: identifiers that do not resolve are ignored, so
/// late callbacks racing a dismiss are harmless. The scheduler is not
/// internally synchronised; share it behind a single mutex or a
/// single-consumer channel.
pub struct Scheduler {
    /// Owners of every record, in creation order (sequence ids ascending).
    jobs: Vec<JobRecord>,
    /// `record_id -> position in jobs`.
    index: HashMap<RecordId, usize>,
    active: Option<RecordId>,
    next_sequence_id: SequenceId,
    options: SchedulerOptions,
    store: Box<dyn SnapshotStore>,
    notifier: Box<dyn EventNotifier>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("jobs", &self.jobs.len())
            .field("active", &self.active)
            .field("next_sequence_id", &self.next_sequence_id)
            .field("options", &self.options)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Empty scheduler. Nothing is read from `store`.
    pub fn new(
        options: SchedulerOptions,
        store: Box<dyn SnapshotStore>,
        notifier: Box<dyn EventNotifier>,
    ) -> Self {
        Self {
            jobs: Vec::new(),
            index: HashMap::new(),
            active: None,
            next_sequence_id: 1,
            options,
            store,
            notifier,
        }
    }

    /// Scheduler hydrated from the last snapshot in `store`.
    ///
    /// Missing, unreadable or undecodable snapshots yield an empty scheduler.
    pub fn restore(
        options: SchedulerOptions,
        store: Box<dyn SnapshotStore>,
        notifier: Box<dyn EventNotifier>,
    ) -> Self {
        let mut scheduler = Self::new(options, store, notifier);

        match scheduler.store.get(&scheduler.options.jobs_key) {
            Ok(Some(raw)) => match decode_jobs(&raw) {
                Ok(restored) => {
                    scheduler.jobs = restored.jobs;
                    scheduler.next_sequence_id = restored.next_sequence_id;
                    scheduler.rebuild_index();
                }
                Err(e) => warn!(error = %e, "ignoring undecodable jobs snapshot"),
            },
            Ok(None) => debug!("no jobs snapshot; starting empty"),
            Err(e) => warn!(error = %e, "failed to read jobs snapshot; starting empty"),
        }

        let stored_active = match scheduler.store.get(&scheduler.options.active_key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to read active job snapshot");
                None
            }
        };
        scheduler.active = match stored_active {
            Some(id) if scheduler.index.contains_key(&id) => Some(id),
            _ => scheduler.most_recent_record_id(),
        };

        // Capacity may have been raised since the snapshot was taken.
        let started = fill_free_slots(
            &mut scheduler.jobs,
            scheduler.options.max_concurrent,
            Utc::now(),
        );

        info!(
            jobs = scheduler.jobs.len(),
            running = running_count(&scheduler.jobs),
            next_sequence_id = scheduler.next_sequence_id,
            "scheduler restored from snapshot"
        );

        if !started.is_empty() {
            scheduler.persist();
        }
        scheduler
    }

    // ----- public operations -------------------------------------------------

    /// Accept a new job.
    ///
    /// The job starts immediately if a running slot is free, otherwise it is
    /// queued. It always becomes the focused job.
    pub fn admit(
        &mut self,
        title: impl Into<String>,
        priority: Option<Priority>,
        parent_sequence_id: Option<SequenceId>,
    ) -> JobRecord {
        let now = Utc::now();
        let sequence_id = self.next_sequence_id;
        self.next_sequence_id += 1;

        let mut job = JobRecord::new(
            sequence_id,
            title.into(),
            priority.unwrap_or_default(),
            parent_sequence_id,
            now,
        );
        if self.can_admit_directly() {
            job.start(now);
        }

        info!(
            sequence_id,
            record_id = %job.record_id,
            priority = %job.priority,
            status = %job.status,
            parent = ?parent_sequence_id,
            "admitted job"
        );

        let record_id = job.record_id.clone();
        self.index.insert(record_id.clone(), self.jobs.len());
        self.jobs.push(job.clone());
        self.active = Some(record_id);

        if let Some(evicted) = evict_if_over_capacity(&mut self.jobs, self.options.max_retained) {
            self.rebuild_index();
            self.repair_focus(&evicted.record_id);
        }

        self.emit(EventKind::Started, &job, None, None);
        self.persist();
        job
    }

    /// Record successful completion of a running job and fill the freed slot.
    pub fn complete(&mut self, record_id: &str, outcome: JobOutcome) {
        let Some(idx) = self.running_index(record_id, "complete") else {
            return;
        };
        let now = Utc::now();

        let job = &mut self.jobs[idx];
        job.finish(JobStatus::Completed, now);
        job.apply_outcome(outcome.clone());
        info!(
            sequence_id = job.sequence_id,
            record_id = %job.record_id,
            score = ?job.score,
            "job completed"
        );
        let snapshot = job.clone();

        self.promote_queued();
        self.emit(EventKind::Completed, &snapshot, Some(outcome), None);
        self.persist();
    }

    /// Record failure of a running job and fill the freed slot.
    pub fn fail(&mut self, record_id: &str, message: impl Into<String>) {
        let Some(idx) = self.running_index(record_id, "fail") else {
            return;
        };
        let now = Utc::now();
        let message = message.into();

        let job = &mut self.jobs[idx];
        job.finish(JobStatus::Error, now);
        job.error_message = Some(message.clone());
        warn!(
            sequence_id = job.sequence_id,
            record_id = %job.record_id,
            error = %message,
            "job failed"
        );
        let snapshot = job.clone();

        self.promote_queued();
        self.emit(EventKind::Failed, &snapshot, None, Some(message));
        self.persist();
    }

    /// Cancel a queued or running job.
    ///
    /// Only bookkeeping changes; aborting in-flight external work is the
    /// caller's job.
    pub fn cancel(&mut self, sequence_id: SequenceId) {
        let Some(idx) = self.position_of_sequence(sequence_id) else {
            debug!(sequence_id, "cancel for unknown job; ignoring");
            return;
        };
        if self.jobs[idx].is_terminal() {
            debug!(
                sequence_id,
                status = %self.jobs[idx].status,
                "cancel for terminal job; ignoring"
            );
            return;
        }

        let job = &mut self.jobs[idx];
        let was_running = job.status == JobStatus::Running;
        job.finish(JobStatus::Cancelled, Utc::now());
        info!(sequence_id, record_id = %job.record_id, was_running, "job cancelled");
        let snapshot = job.clone();

        if was_running {
            self.promote_queued();
        }
        self.emit(EventKind::Cancelled, &snapshot, None, None);
        self.persist();
    }

    /// Remove a terminal job from the retained set.
    pub fn dismiss(&mut self, sequence_id: SequenceId) {
        let Some(idx) = self.position_of_sequence(sequence_id) else {
            debug!(sequence_id, "dismiss for unknown job; ignoring");
            return;
        };
        if !self.jobs[idx].is_terminal() {
            debug!(
                sequence_id,
                status = %self.jobs[idx].status,
                "dismiss for active job; cancel it first"
            );
            return;
        }

        let removed = self.jobs.remove(idx);
        self.rebuild_index();
        self.repair_focus(&removed.record_id);
        info!(sequence_id, record_id = %removed.record_id, "job dismissed");

        self.persist();
    }

    /// Raise a queued job to interactive priority for the next promotion.
    ///
    /// Does not start the job.
    pub fn promote(&mut self, sequence_id: SequenceId) {
        let Some(idx) = self.position_of_sequence(sequence_id) else {
            debug!(sequence_id, "promote for unknown job; ignoring");
            return;
        };

        let job = &mut self.jobs[idx];
        if job.status != JobStatus::Queued {
            debug!(sequence_id, status = %job.status, "promote for non-queued job; ignoring");
            return;
        }
        if job.priority == Priority::Interactive {
            return;
        }

        job.priority = Priority::Interactive;
        info!(sequence_id, record_id = %job.record_id, "queued job raised to interactive");
        self.persist();
    }

    /// Update stage/progress of a running job. `progress` is clamped to `[0, 1]`.
    pub fn update_progress(&mut self, record_id: &str, stage: impl Into<String>, progress: f64) {
        let Some(idx) = self.running_index(record_id, "update_progress") else {
            return;
        };

        let job = &mut self.jobs[idx];
        job.set_progress(stage.into(), progress);
        debug!(
            sequence_id = job.sequence_id,
            stage = ?job.current_stage,
            progress = job.progress,
            "job progress"
        );
        self.persist();
    }

    /// Re-admit a failed or cancelled job as a child of the original.
    ///
    /// Returns the new record, or `None` if the job is unknown or not in
    /// `error`/`cancelled`. The original is left untouched.
    pub fn retry(&mut self, sequence_id: SequenceId) -> Option<JobRecord> {
        let idx = self.position_of_sequence(sequence_id)?;
        let original = &self.jobs[idx];
        if !matches!(original.status, JobStatus::Error | JobStatus::Cancelled) {
            debug!(sequence_id, status = %original.status, "retry for non-retryable job; ignoring");
            return None;
        }

        let title = original.title.clone();
        let priority = original.priority;
        Some(self.admit(title, Some(priority), Some(sequence_id)))
    }

    /// Move the focus cursor to a known job.
    pub fn focus(&mut self, record_id: &str) {
        if !self.index.contains_key(record_id) {
            debug!(record_id, "focus on unknown job; ignoring");
            return;
        }
        if self.active.as_deref() == Some(record_id) {
            return;
        }
        self.active = Some(record_id.to_string());
        self.persist();
    }

    /// Clear every job, the focus cursor, the sequence allocator and the
    /// snapshot store.
    pub fn reset(&mut self) {
        self.jobs.clear();
        self.index.clear();
        self.active = None;
        self.next_sequence_id = 1;

        for key in [&self.options.jobs_key, &self.options.active_key] {
            if let Err(e) = self.store.remove(key) {
                warn!(key = %key, error = %e, "failed to clear snapshot key");
            }
        }
        info!("scheduler reset");
    }

    // ----- derived views -----------------------------------------------------

    /// Queued jobs in the order they would be promoted.
    pub fn queue(&self) -> Vec<&JobRecord> {
        promotion_order(&self.jobs)
            .into_iter()
            .map(|i| &self.jobs[i])
            .collect()
    }

    pub fn running(&self) -> Vec<&JobRecord> {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Running)
            .collect()
    }

    pub fn can_admit_directly(&self) -> bool {
        running_count(&self.jobs) < self.options.max_concurrent
    }

    pub fn active_job(&self) -> Option<&JobRecord> {
        self.active.as_deref().and_then(|id| self.job(id))
    }

    pub fn active_job_record_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// All retained jobs in creation order.
    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn job(&self, record_id: &str) -> Option<&JobRecord> {
        self.index.get(record_id).map(|&i| &self.jobs[i])
    }

    pub fn job_by_sequence(&self, sequence_id: SequenceId) -> Option<&JobRecord> {
        self.position_of_sequence(sequence_id).map(|i| &self.jobs[i])
    }

    pub fn next_sequence_id(&self) -> SequenceId {
        self.next_sequence_id
    }

    pub fn max_concurrent(&self) -> usize {
        self.options.max_concurrent
    }

    pub fn max_retained(&self) -> usize {
        self.options.max_retained
    }

    // ----- internals ---------------------------------------------------------

    fn promote_queued(&mut self) {
        fill_free_slots(&mut self.jobs, self.options.max_concurrent, Utc::now());
    }

    /// Sequence ids ascend along `jobs`, so a binary search resolves them.
    fn position_of_sequence(&self, sequence_id: SequenceId) -> Option<usize> {
        self.jobs
            .binary_search_by_key(&sequence_id, |j| j.sequence_id)
            .ok()
    }

    fn running_index(&self, record_id: &str, op: &'static str) -> Option<usize> {
        let Some(&idx) = self.index.get(record_id) else {
            debug!(record_id, op, "unknown record id; ignoring");
            return None;
        };
        let status = self.jobs[idx].status;
        if status != JobStatus::Running {
            debug!(record_id, op, status = %status, "job not running; ignoring");
            return None;
        }
        Some(idx)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .jobs
            .iter()
            .enumerate()
            .map(|(i, j)| (j.record_id.clone(), i))
            .collect();
    }

    fn most_recent_record_id(&self) -> Option<RecordId> {
        self.jobs.last().map(|j| j.record_id.clone())
    }

    /// Keep the focus cursor pointing at a retained job after `removed` left.
    fn repair_focus(&mut self, removed: &str) {
        if self.active.as_deref() == Some(removed) {
            self.active = self.most_recent_record_id();
            debug!(active = ?self.active, "focus moved after removal");
        }
    }

    fn emit(
        &self,
        kind: EventKind,
        job: &JobRecord,
        outcome: Option<JobOutcome>,
        error_message: Option<String>,
    ) {
        self.notifier.emit(LifecycleEvent {
            kind,
            source: SCHEDULER_SOURCE,
            payload: EventPayload {
                record_id: job.record_id.clone(),
                sequence_id: job.sequence_id,
                title: job.title.clone(),
                outcome,
                error_message,
            },
        });
    }

    /// Write the snapshot. Failures are logged and swallowed.
    fn persist(&mut self) {
        match encode_jobs(&self.jobs, self.next_sequence_id) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&self.options.jobs_key, &raw) {
                    warn!(error = %e, "failed to persist jobs snapshot");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode jobs snapshot"),
        }

        let result = match &self.active {
            Some(id) => self.store.set(&self.options.active_key, id),
            None => self.store.remove(&self.options.active_key),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to persist active job");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::events::EventBus;
    use crate::store::MemoryStore;

    fn options(max_concurrent: usize, max_retained: usize) -> SchedulerOptions {
        SchedulerOptions {
            max_concurrent,
            max_retained,
            ..SchedulerOptions::default()
        }
    }

    fn scheduler(max_concurrent: usize, max_retained: usize) -> Scheduler {
        Scheduler::new(
            options(max_concurrent, max_retained),
            Box::new(MemoryStore::new()),
            Box::new(EventBus::new()),
        )
    }

    fn statuses(s: &Scheduler) -> Vec<JobStatus> {
        s.jobs().iter().map(|j| j.status).collect()
    }

    #[test]
    fn admission_respects_capacity() {
        let mut s = scheduler(1, 10);
        let first = s.admit("a", None, None);
        let second = s.admit("b", None, None);

        assert_eq!(first.status, JobStatus::Running);
        assert!(first.started_at.is_some());
        assert_eq!(second.status, JobStatus::Queued);
        assert!(second.started_at.is_none());
        assert_eq!(first.priority, Priority::Interactive);
        assert!(!s.can_admit_directly());
    }

    #[test]
    fn newly_admitted_job_takes_focus() {
        let mut s = scheduler(1, 10);
        s.admit("a", None, None);
        let b = s.admit("b", Some(Priority::Batch), None);
        assert_eq!(s.active_job().map(|j| j.sequence_id), Some(b.sequence_id));
    }

    #[test]
    fn completion_promotes_interactive_before_earlier_batch() {
        let mut s = scheduler(1, 10);
        let running = s.admit("running", None, None);
        s.admit("batch", Some(Priority::Batch), None);
        s.admit("interactive", Some(Priority::Interactive), None);

        s.complete(&running.record_id, JobOutcome::default());

        assert_eq!(
            statuses(&s),
            vec![JobStatus::Completed, JobStatus::Queued, JobStatus::Running]
        );
        assert!(s.jobs()[0].completed_at.is_some());
    }

    #[test]
    fn cancelling_queued_job_does_not_promote() {
        let mut s = scheduler(1, 10);
        s.admit("a", None, None);
        let b = s.admit("b", None, None);
        s.admit("c", None, None);

        s.cancel(b.sequence_id);

        assert_eq!(
            statuses(&s),
            vec![JobStatus::Running, JobStatus::Cancelled, JobStatus::Queued]
        );
    }

    #[test]
    fn cancelling_running_job_frees_slot() {
        let mut s = scheduler(1, 10);
        let a = s.admit("a", None, None);
        s.admit("b", None, None);

        s.cancel(a.sequence_id);

        assert_eq!(statuses(&s), vec![JobStatus::Cancelled, JobStatus::Running]);
    }

    #[test]
    fn terminal_jobs_ignore_further_transitions() {
        let mut s = scheduler(1, 10);
        let a = s.admit("a", None, None);
        s.complete(&a.record_id, JobOutcome::default());
        let completed_at = s.jobs()[0].completed_at;

        s.cancel(a.sequence_id);
        s.fail(&a.record_id, "late");
        s.update_progress(&a.record_id, "late stage", 0.5);

        let job = &s.jobs()[0];
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_at, completed_at);
        assert!(job.error_message.is_none());
        assert!(job.current_stage.is_none());
    }

    #[test]
    fn completing_a_queued_job_is_ignored() {
        let mut s = scheduler(1, 10);
        s.admit("a", None, None);
        let b = s.admit("b", None, None);

        s.complete(&b.record_id, JobOutcome::default());

        assert_eq!(s.jobs()[1].status, JobStatus::Queued);
    }

    #[test]
    fn dismiss_only_removes_terminal_jobs_and_repairs_focus() {
        let mut s = scheduler(2, 10);
        let a = s.admit("a", None, None);
        let b = s.admit("b", None, None);

        s.dismiss(b.sequence_id);
        assert_eq!(s.jobs().len(), 2);

        s.complete(&b.record_id, JobOutcome::default());
        assert_eq!(s.active_job_record_id(), Some(b.record_id.as_str()));
        s.dismiss(b.sequence_id);

        assert_eq!(s.jobs().len(), 1);
        assert_eq!(s.active_job_record_id(), Some(a.record_id.as_str()));
        assert!(s.job(&b.record_id).is_none());
        assert_eq!(s.job(&a.record_id).map(|j| j.sequence_id), Some(a.sequence_id));

        s.cancel(a.sequence_id);
        s.dismiss(a.sequence_id);
        assert!(s.jobs().is_empty());
        assert!(s.active_job().is_none());
    }

    #[test]
    fn promote_changes_rank_only_for_queued_jobs() {
        let mut s = scheduler(1, 10);
        let a = s.admit("a", Some(Priority::Batch), None);
        let b = s.admit("b", Some(Priority::Batch), None);
        let c = s.admit("c", Some(Priority::Batch), None);

        s.promote(a.sequence_id);
        s.promote(c.sequence_id);

        assert_eq!(s.jobs()[0].priority, Priority::Batch);
        assert_eq!(s.jobs()[2].priority, Priority::Interactive);
        let order: Vec<_> = s.queue().iter().map(|j| j.sequence_id).collect();
        assert_eq!(order, vec![c.sequence_id, b.sequence_id]);
        assert_eq!(s.jobs()[2].status, JobStatus::Queued);
    }

    #[test]
    fn progress_is_clamped_and_only_for_running() {
        let mut s = scheduler(1, 10);
        let a = s.admit("a", None, None);
        let b = s.admit("b", None, None);

        s.update_progress(&a.record_id, "mutate", 3.0);
        s.update_progress(&b.record_id, "mutate", 0.5);

        assert_eq!(s.jobs()[0].progress, 1.0);
        assert_eq!(s.jobs()[0].current_stage.as_deref(), Some("mutate"));
        assert_eq!(s.jobs()[1].progress, 0.0);
        assert!(s.jobs()[1].current_stage.is_none());
    }

    #[test]
    fn eviction_drops_oldest_terminal() {
        let mut s = scheduler(3, 3);
        let a = s.admit("a", None, None);
        let b = s.admit("b", None, None);
        let c = s.admit("c", None, None);
        s.fail(&b.record_id, "boom");
        s.complete(&a.record_id, JobOutcome::default());
        let _ = c;

        s.admit("d", None, None);

        let seqs: Vec<_> = s.jobs().iter().map(|j| j.sequence_id).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert!(s.job(&a.record_id).is_none());
        assert_eq!(s.next_sequence_id(), 5);
    }

    #[test]
    fn retention_bound_yields_to_active_work() {
        let mut s = scheduler(1, 2);
        s.admit("a", None, None);
        s.admit("b", None, None);
        s.admit("c", None, None);

        assert_eq!(s.jobs().len(), 3);
    }

    #[test]
    fn retry_links_to_parent_without_touching_it() {
        let mut s = scheduler(1, 10);
        let a = s.admit("optimise", Some(Priority::Batch), None);
        s.fail(&a.record_id, "timeout");

        let child = s.retry(a.sequence_id).unwrap();

        assert_eq!(child.parent_sequence_id, Some(a.sequence_id));
        assert_eq!(child.title, "optimise");
        assert_eq!(child.priority, Priority::Batch);
        assert_eq!(child.status, JobStatus::Running);
        assert_eq!(s.jobs()[0].status, JobStatus::Error);

        assert!(s.retry(child.sequence_id).is_none());
        assert!(s.retry(99).is_none());
    }

    #[test]
    fn unknown_identifiers_are_ignored() {
        let mut s = scheduler(1, 10);
        s.admit("a", None, None);
        let before = s.jobs().to_vec();

        s.complete("nope", JobOutcome::default());
        s.fail("nope", "x");
        s.cancel(42);
        s.dismiss(42);
        s.promote(42);
        s.update_progress("nope", "x", 0.1);
        s.focus("nope");

        assert_eq!(s.jobs(), before.as_slice());
    }

    #[test]
    fn events_follow_lifecycle() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |e| sink.lock().unwrap().push((e.kind, e.payload.sequence_id)));

        let mut s = Scheduler::new(options(1, 10), Box::new(MemoryStore::new()), Box::new(bus));
        let a = s.admit("a", None, None);
        let b = s.admit("b", None, None);
        let c = s.admit("c", None, None);
        s.complete(&a.record_id, JobOutcome::default());
        s.fail(&b.record_id, "bad");
        s.cancel(c.sequence_id);
        s.cancel(c.sequence_id);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (EventKind::Started, 1),
                (EventKind::Started, 2),
                (EventKind::Started, 3),
                (EventKind::Completed, 1),
                (EventKind::Failed, 2),
                (EventKind::Cancelled, 3),
            ]
        );
    }

    #[test]
    fn snapshot_survives_restore() {
        let store = MemoryStore::new();
        let mut s = Scheduler::new(
            options(1, 10),
            Box::new(store.clone()),
            Box::new(EventBus::new()),
        );
        let a = s.admit("a", None, None);
        let b = s.admit("b", Some(Priority::Batch), Some(a.sequence_id));
        s.focus(&a.record_id);

        let restored = Scheduler::restore(
            options(1, 10),
            Box::new(store.clone()),
            Box::new(EventBus::new()),
        );

        assert_eq!(restored.jobs().len(), 2);
        assert_eq!(restored.active_job_record_id(), Some(a.record_id.as_str()));
        assert_eq!(restored.jobs()[1].parent_sequence_id, Some(a.sequence_id));
        assert_eq!(restored.jobs()[1].record_id, b.record_id);
        assert_eq!(restored.next_sequence_id(), 3);
    }

    #[test]
    fn reset_clears_state_and_store() {
        let store = MemoryStore::new();
        let mut s = Scheduler::new(
            options(1, 10),
            Box::new(store.clone()),
            Box::new(EventBus::new()),
        );
        s.admit("a", None, None);
        assert!(!store.is_empty());

        s.reset();

        assert!(s.jobs().is_empty());
        assert!(s.active_job().is_none());
        assert_eq!(s.next_sequence_id(), 1);
        assert!(store.is_empty());
    }
}
