use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::events::{EventBus, EventFilter, SyncObserver};
use crate::types::CycleId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub state: CycleState,
    pub cycle: Option<CycleId>,
    pub percent: u8,
    pub last_completed: Option<CycleId>,
    pub last_error: Option<String>,
    pub completed_cycles: u64,
    pub failed_cycles: u64,
}

/// Last known sync state, folded from bus events.
#[derive(Clone, Default)]
pub struct SyncStatus {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }

    /// Subscribe to `bus` and keep this status current on a dedicated task.
    pub fn track(&self, bus: &EventBus) -> JoinHandle<()> {
        let subscription = bus.subscribe(EventFilter::All);
        let mut status = self.clone();
        tokio::spawn(async move {
            subscription.dispatch(&mut status).await;
        })
    }
}

impl SyncObserver for SyncStatus {
    fn on_progress(&mut self, cycle: CycleId, percent: u8) {
        self.update(|s| {
            s.state = CycleState::Running;
            s.cycle = Some(cycle);
            s.percent = percent;
        });
    }

    fn on_completed(&mut self, cycle: CycleId) {
        self.update(|s| {
            s.state = CycleState::Completed;
            s.cycle = Some(cycle);
            s.percent = 100;
            s.last_completed = Some(cycle);
            s.completed_cycles += 1;
        });
    }

    fn on_failed(&mut self, cycle: CycleId, reason: &str) {
        self.update(|s| {
            s.state = CycleState::Failed;
            s.cycle = Some(cycle);
            s.last_error = Some(reason.to_string());
            s.failed_cycles += 1;
        });
    }
}
