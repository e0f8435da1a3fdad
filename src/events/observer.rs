use super::{EventKind, SyncEvent};
use crate::types::CycleId;

/// Consumer-side callbacks, invoked by [`super::Subscription::dispatch`].
pub trait SyncObserver {
    fn on_progress(&mut self, cycle: CycleId, percent: u8);

    /// The consumer's cue to reload whatever it renders from the store.
    fn on_completed(&mut self, cycle: CycleId);

    fn on_failed(&mut self, cycle: CycleId, reason: &str) {
        log::warn!("sync cycle {} failed: {}", cycle, reason);
    }

    fn observe(&mut self, event: &SyncEvent) {
        match &event.kind {
            EventKind::Progress { percent } => self.on_progress(event.cycle, *percent),
            EventKind::Completed => self.on_completed(event.cycle),
            EventKind::Failed { reason } => self.on_failed(event.cycle, reason),
        }
    }
}
