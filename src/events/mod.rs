//! Publish/subscribe channel carrying sync progress from background cycles to consumers.
//!
//! Each subscriber owns an unbounded FIFO queue, so publishing never blocks and every event a
//! single cycle publishes reaches a subscriber in publication order. Events from overlapping
//! cycles may interleave; [`SyncEvent::cycle`] tells them apart.

mod observer;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::types::CycleId;

pub use observer::SyncObserver;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Progress { percent: u8 },
    Completed,
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub cycle: CycleId,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Progress,
    Completed,
    Failed,
}

impl EventFilter {
    fn matches(self, kind: &EventKind) -> bool {
        matches!(
            (self, kind),
            (EventFilter::All, _)
                | (EventFilter::Progress, EventKind::Progress { .. })
                | (EventFilter::Completed, EventKind::Completed)
                | (EventFilter::Failed, EventKind::Failed { .. })
        )
    }
}

struct Subscriber {
    filter: EventFilter,
    tx: mpsc::UnboundedSender<SyncEvent>,
}

/// Cheaply cloneable handle; all clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // A panicking subscriber list holder cannot leave the Vec half-updated.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(Subscriber { filter, tx });
        Subscription { rx }
    }

    /// Deliver `event` to every matching subscriber. Safe to call from any thread.
    ///
    /// Subscribers whose [`Subscription`] has been dropped are pruned here.
    pub fn publish(&self, event: SyncEvent) {
        self.subscribers().retain(|sub| {
            if !sub.filter.matches(&event.kind) {
                return !sub.tx.is_closed();
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }

    pub fn progress(&self, cycle: CycleId, percent: u8) {
        self.publish(SyncEvent {
            cycle,
            kind: EventKind::Progress { percent },
        });
    }

    pub fn completed(&self, cycle: CycleId) {
        self.publish(SyncEvent {
            cycle,
            kind: EventKind::Completed,
        });
    }

    pub fn failed(&self, cycle: CycleId, reason: impl Into<String>) {
        self.publish(SyncEvent {
            cycle,
            kind: EventKind::Failed {
                reason: reason.into(),
            },
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}

/// Receiving end of one subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl Subscription {
    /// Next event, or `None` once every [`EventBus`] clone is gone.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything queued right now, without waiting.
    pub fn drain(&mut self) -> Vec<SyncEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
        out
    }

    /// Feed events to `observer` on the calling task until the bus goes away.
    ///
    /// The calling task is the consumer's context: callbacks run there and nowhere else.
    pub async fn dispatch<O: SyncObserver + ?Sized>(mut self, observer: &mut O) {
        while let Some(event) = self.rx.recv().await {
            observer.observe(&event);
        }
    }
}
