// tests/scheduler_behaviour.rs

use forgeq::events::SCHEDULER_SOURCE;
use forgeq::scheduler::JobOutcome;
use forgeq::types::{EventKind, JobStatus, Priority};
use forgeq_test_utils::builders::SchedulerBuilder;
use forgeq_test_utils::fakes::RecordingNotifier;
use forgeq_test_utils::init_tracing;

fn outcome(score: f64) -> JobOutcome {
    JobOutcome {
        score: Some(score),
        strategy_used: Some("greedy".to_string()),
        ..JobOutcome::default()
    }
}

#[test]
fn second_job_queues_behind_single_slot() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();

    let first = s.admit("first", None, None);
    let second = s.admit("second", None, None);

    assert_eq!(first.status, JobStatus::Running);
    assert!(first.started_at.is_some());
    assert_eq!(second.status, JobStatus::Queued);
    assert!(second.started_at.is_none());
    assert!(!s.can_admit_directly());
    assert_eq!(s.running().len(), 1);
    assert_eq!(s.queue().len(), 1);
}

#[test]
fn completing_sole_running_job_promotes_queued_one() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let first = s.admit("first", None, None);
    let second = s.admit("second", None, None);

    s.complete(&first.record_id, outcome(0.9));

    let first = s.job(&first.record_id).unwrap();
    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(first.score, Some(0.9));
    assert_eq!(first.strategy_used.as_deref(), Some("greedy"));
    assert!(first.completed_at.is_some());

    let second = s.job(&second.record_id).unwrap();
    assert_eq!(second.status, JobStatus::Running);
    assert!(second.started_at.is_some());
}

#[test]
fn interactive_job_is_promoted_ahead_of_earlier_batch_job() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let running = s.admit("running", None, None);
    let batch = s.admit("batch", Some(Priority::Batch), None);
    let interactive = s.admit("interactive", Some(Priority::Interactive), None);

    let queue: Vec<_> = s.queue().iter().map(|j| j.sequence_id).collect();
    assert_eq!(queue, vec![interactive.sequence_id, batch.sequence_id]);

    s.complete(&running.record_id, JobOutcome::default());

    assert_eq!(
        s.job(&interactive.record_id).unwrap().status,
        JobStatus::Running
    );
    assert_eq!(s.job(&batch.record_id).unwrap().status, JobStatus::Queued);
}

#[test]
fn batch_work_still_runs_once_interactive_demand_is_gone() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let a = s.admit("a", None, None);
    let batch = s.admit("batch", Some(Priority::Batch), None);
    let b = s.admit("b", None, None);

    s.fail(&a.record_id, "diverged");
    s.complete(&b.record_id, JobOutcome::default());

    assert_eq!(s.job(&batch.record_id).unwrap().status, JobStatus::Running);
}

#[test]
fn promote_changes_rank_but_not_status() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let running = s.admit("running", None, None);
    let early = s.admit("early interactive", None, None);
    let batch = s.admit("batch", Some(Priority::Batch), None);

    s.promote(batch.sequence_id);
    let promoted = s.job(&batch.record_id).unwrap();
    assert_eq!(promoted.priority, Priority::Interactive);
    assert_eq!(promoted.status, JobStatus::Queued);

    // Same class now; FIFO decides.
    s.complete(&running.record_id, JobOutcome::default());
    assert_eq!(s.job(&early.record_id).unwrap().status, JobStatus::Running);
    assert_eq!(s.job(&batch.record_id).unwrap().status, JobStatus::Queued);
}

#[test]
fn promote_ignores_running_jobs() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let running = s.admit("running", Some(Priority::Batch), None);

    s.promote(running.sequence_id);

    assert_eq!(s.job(&running.record_id).unwrap().priority, Priority::Batch);
}

#[test]
fn dismiss_removes_terminal_jobs_only() {
    init_tracing();
    let mut s = SchedulerBuilder::new().max_concurrent(2).build();
    let done = s.admit("done", None, None);
    let busy = s.admit("busy", None, None);
    s.complete(&done.record_id, JobOutcome::default());

    s.dismiss(busy.sequence_id);
    assert_eq!(s.jobs().len(), 2);
    assert_eq!(s.job(&busy.record_id).unwrap().status, JobStatus::Running);

    s.dismiss(done.sequence_id);
    assert_eq!(s.jobs().len(), 1);
    assert!(s.job(&done.record_id).is_none());
    assert!(s.job_by_sequence(done.sequence_id).is_none());
}

#[test]
fn dismissing_focused_job_moves_focus_to_most_recent() {
    let mut s = SchedulerBuilder::new().max_concurrent(3).build();
    let a = s.admit("a", None, None);
    let b = s.admit("b", None, None);
    let c = s.admit("c", None, None);
    s.complete(&c.record_id, JobOutcome::default());
    assert_eq!(s.active_job_record_id(), Some(c.record_id.as_str()));

    s.dismiss(c.sequence_id);
    assert_eq!(s.active_job().map(|j| j.sequence_id), Some(b.sequence_id));

    s.cancel(a.sequence_id);
    s.cancel(b.sequence_id);
    s.dismiss(b.sequence_id);
    s.dismiss(a.sequence_id);
    assert!(s.jobs().is_empty());
    assert!(s.active_job().is_none());
}

#[test]
fn eleventh_admission_evicts_oldest_terminal_job() {
    init_tracing();
    let mut s = SchedulerBuilder::new()
        .max_concurrent(10)
        .max_retained(10)
        .build();

    let jobs: Vec<_> = (0..10).map(|i| s.admit(format!("job {i}"), None, None)).collect();
    // Terminal jobs: #3 (error) and #5 (completed). #3 is older.
    s.fail(&jobs[2].record_id, "boom");
    s.complete(&jobs[4].record_id, JobOutcome::default());

    s.admit("eleventh", None, None);

    assert_eq!(s.jobs().len(), 10);
    assert!(s.job(&jobs[2].record_id).is_none());
    assert!(s.job(&jobs[4].record_id).is_some());
    assert!(s.job(&jobs[0].record_id).is_some());
}

#[test]
fn no_eviction_without_terminal_jobs() {
    let mut s = SchedulerBuilder::new()
        .max_concurrent(1)
        .max_retained(3)
        .build();
    for i in 0..4 {
        s.admit(format!("job {i}"), None, None);
    }
    assert_eq!(s.jobs().len(), 4);
}

#[test]
fn progress_only_moves_while_running() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let a = s.admit("a", None, None);
    let queued = s.admit("queued", None, None);

    s.update_progress(&a.record_id, "mutating", 1.7);
    let job = s.job(&a.record_id).unwrap();
    assert_eq!(job.current_stage.as_deref(), Some("mutating"));
    assert_eq!(job.progress, 1.0);

    s.update_progress(&queued.record_id, "early", 0.3);
    assert!(s.job(&queued.record_id).unwrap().current_stage.is_none());

    s.complete(&a.record_id, JobOutcome::default());
    s.update_progress(&a.record_id, "late", 0.2);
    let job = s.job(&a.record_id).unwrap();
    assert_eq!(job.current_stage.as_deref(), Some("mutating"));
    assert_eq!(job.progress, 1.0);
}

#[test]
fn negative_and_nan_progress_clamp_to_zero() {
    let mut s = SchedulerBuilder::new().build();
    let a = s.admit("a", None, None);

    s.update_progress(&a.record_id, "warmup", -0.5);
    assert_eq!(s.job(&a.record_id).unwrap().progress, 0.0);

    s.update_progress(&a.record_id, "warmup", 0.4);
    s.update_progress(&a.record_id, "warmup", f64::NAN);
    assert_eq!(s.job(&a.record_id).unwrap().progress, 0.0);
}

#[test]
fn terminal_states_are_final() {
    let mut s = SchedulerBuilder::new().build();
    let a = s.admit("a", None, None);
    s.complete(&a.record_id, outcome(0.5));
    let completed_at = s.job(&a.record_id).unwrap().completed_at;

    s.cancel(a.sequence_id);
    s.fail(&a.record_id, "too late");
    s.complete(&a.record_id, outcome(0.1));

    let job = s.job(&a.record_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.score, Some(0.5));
    assert!(job.error_message.is_none());
    assert_eq!(job.completed_at, completed_at);
}

#[test]
fn unknown_identifiers_leave_state_unchanged() {
    let notifier = RecordingNotifier::new();
    let mut s = SchedulerBuilder::new()
        .notifier(notifier.clone())
        .max_concurrent(1)
        .build();
    s.admit("a", None, None);
    s.admit("b", Some(Priority::Batch), None);
    let before = s.jobs().to_vec();
    notifier.clear();

    s.complete("no-such-record", JobOutcome::default());
    s.fail("no-such-record", "boom");
    s.update_progress("no-such-record", "stage", 0.5);
    s.focus("no-such-record");
    s.cancel(99);
    s.dismiss(99);
    s.promote(99);
    assert!(s.retry(99).is_none());

    assert_eq!(s.jobs(), before.as_slice());
    assert!(notifier.events().is_empty());
}

#[test]
fn complete_on_queued_job_is_ignored() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    s.admit("a", None, None);
    let queued = s.admit("b", None, None);

    s.complete(&queued.record_id, outcome(1.0));

    assert_eq!(s.job(&queued.record_id).unwrap().status, JobStatus::Queued);
}

#[test]
fn cancelling_queued_job_does_not_promote() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let a = s.admit("a", None, None);
    let b = s.admit("b", None, None);
    let c = s.admit("c", None, None);

    s.cancel(b.sequence_id);

    assert_eq!(s.job(&a.record_id).unwrap().status, JobStatus::Running);
    assert_eq!(s.job(&b.record_id).unwrap().status, JobStatus::Cancelled);
    assert!(s.job(&b.record_id).unwrap().completed_at.is_some());
    assert_eq!(s.job(&c.record_id).unwrap().status, JobStatus::Queued);

    s.cancel(a.sequence_id);
    assert_eq!(s.job(&c.record_id).unwrap().status, JobStatus::Running);
}

#[test]
fn lifecycle_events_follow_transitions() {
    init_tracing();
    let notifier = RecordingNotifier::new();
    let mut s = SchedulerBuilder::new()
        .notifier(notifier.clone())
        .max_concurrent(1)
        .build();

    let a = s.admit("a", None, None);
    let b = s.admit("b", None, None);
    let c = s.admit("c", None, None);
    s.complete(&a.record_id, outcome(0.7));
    s.fail(&b.record_id, "out of memory");
    s.cancel(c.sequence_id);
    s.dismiss(a.sequence_id);

    assert_eq!(
        notifier.kinds(),
        vec![
            (EventKind::Started, 1),
            (EventKind::Started, 2),
            (EventKind::Started, 3),
            (EventKind::Completed, 1),
            (EventKind::Failed, 2),
            (EventKind::Cancelled, 3),
        ]
    );

    let events = notifier.events();
    assert!(events.iter().all(|e| e.source == SCHEDULER_SOURCE));
    assert_eq!(events[0].payload.title, "a");
    assert_eq!(events[3].payload.outcome.as_ref().and_then(|o| o.score), Some(0.7));
    assert_eq!(
        events[4].payload.error_message.as_deref(),
        Some("out of memory")
    );
}

#[test]
fn retry_admits_child_and_leaves_parent_alone() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let a = s.admit("tune", Some(Priority::Batch), None);
    s.fail(&a.record_id, "diverged");

    let child = s.retry(a.sequence_id).unwrap();

    assert_eq!(child.title, "tune");
    assert_eq!(child.priority, Priority::Batch);
    assert_eq!(child.parent_sequence_id, Some(a.sequence_id));
    assert!(child.sequence_id > a.sequence_id);
    assert_eq!(s.active_job_record_id(), Some(child.record_id.as_str()));

    let parent = s.job(&a.record_id).unwrap();
    assert_eq!(parent.status, JobStatus::Error);
    assert_eq!(parent.error_message.as_deref(), Some("diverged"));
}

#[test]
fn retry_refuses_completed_and_live_jobs() {
    let mut s = SchedulerBuilder::new().max_concurrent(1).build();
    let a = s.admit("a", None, None);
    let b = s.admit("b", None, None);
    assert!(s.retry(a.sequence_id).is_none());
    assert!(s.retry(b.sequence_id).is_none());

    s.complete(&a.record_id, JobOutcome::default());
    assert!(s.retry(a.sequence_id).is_none());
    assert_eq!(s.jobs().len(), 2);
}

#[test]
fn reset_clears_jobs_and_restarts_sequence() {
    let mut s = SchedulerBuilder::new().build();
    s.admit("a", None, None);
    s.admit("b", None, None);

    s.reset();

    assert!(s.jobs().is_empty());
    assert!(s.active_job().is_none());
    assert_eq!(s.next_sequence_id(), 1);
    assert_eq!(s.admit("fresh", None, None).sequence_id, 1);
}
