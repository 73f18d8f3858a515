// src/events/bus.rs

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{EventNotifier, LifecycleEvent};

type Subscriber = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

/// Synchronous publish/subscribe fan-out.
///
/// Subscribers are called in subscription order on the emitting thread.
/// Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0);
        f.debug_struct("EventBus")
            .field("subscribers", &count)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        let Ok(mut inner) = self.inner.lock() else {
            warn!("event bus poisoned; subscription dropped");
            return SubscriptionId(u64::MAX);
        };
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(f)));
        id
    }

    /// Returns `true` if a subscriber was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        before != inner.subscribers.len()
    }
}

impl EventNotifier for EventBus {
    fn emit(&self, event: LifecycleEvent) {
        let Ok(inner) = self.inner.lock() else {
            warn!(kind = %event.kind, "event bus poisoned; dropping event");
            return;
        };
        debug!(
            kind = %event.kind,
            source = event.source,
            sequence_id = event.payload.sequence_id,
            subscribers = inner.subscribers.len(),
            "emitting lifecycle event"
        );
        for (_, subscriber) in inner.subscribers.iter() {
            subscriber(&event);
        }
    }
}
