// src/events/mod.rs

//! Lifecycle notifications.
//!
//! The scheduler pushes one [`LifecycleEvent`] per accepted/terminal
//! transition into an [`EventNotifier`]. Delivery is synchronous and
//! fire-and-forget: the scheduler never waits on or inspects subscriber
//! behaviour.

use serde::Serialize;

use crate::scheduler::JobOutcome;
use crate::types::{EventKind, RecordId, SequenceId};

pub mod bus;

pub use bus::{EventBus, SubscriptionId};

/// Source tag attached to every event emitted by the scheduler.
pub const SCHEDULER_SOURCE: &str = "forge-scheduler";

/// Data carried by a lifecycle event.
///
/// `record_id`, `sequence_id` and `title` are always present; `outcome` is set
/// for `completed`, `error_message` for `failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub record_id: RecordId,
    pub sequence_id: SequenceId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub source: &'static str,
    pub payload: EventPayload,
}

/// Consumer-side publish interface.
pub trait EventNotifier: Send {
    fn emit(&self, event: LifecycleEvent);
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl EventNotifier for NullNotifier {
    fn emit(&self, _event: LifecycleEvent) {}
}
