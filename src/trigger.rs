use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::synchronizer::{SyncError, Synchronizer};
use crate::types::{CycleId, CycleReport};

pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 10;

/// What to do when a cycle is requested while another one is still running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OverlapPolicy {
    /// Drop the request and log it.
    #[default]
    Skip,
    /// Run the request as soon as the active cycle finishes. At most one request waits;
    /// further ones are dropped like under `Skip`.
    Queue,
    /// Run concurrently; the store still serializes individual writes.
    Allow,
}

/// Handle to one spawned cycle.
pub struct CycleHandle {
    id: CycleId,
    cancel: CancellationToken,
    task: JoinHandle<Result<CycleReport, SyncError>>,
}

impl CycleHandle {
    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<CycleReport, SyncError> {
        self.task.await.map_err(SyncError::Worker)?
    }
}

struct Inner {
    sync: Synchronizer,
    policy: OverlapPolicy,
    shutdown: CancellationToken,
    next_id: AtomicU64,
    gate: Arc<tokio::sync::Mutex<()>>,
    queued: AtomicBool,
    active: Mutex<BTreeMap<CycleId, CancellationToken>>,
}

enum Admission {
    Now(Option<OwnedMutexGuard<()>>),
    AfterActive,
}

/// Starts synchronizer cycles on background tasks, on a timer or on demand.
///
/// Cloning yields another handle to the same trigger.
#[derive(Clone)]
pub struct Trigger {
    inner: Arc<Inner>,
}

impl Trigger {
    pub fn new(sync: Synchronizer, policy: OverlapPolicy, shutdown: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                sync,
                policy,
                shutdown,
                next_id: AtomicU64::new(1),
                gate: Arc::new(tokio::sync::Mutex::new(())),
                queued: AtomicBool::new(false),
                active: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    fn active(&self) -> MutexGuard<'_, BTreeMap<CycleId, CancellationToken>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ids of cycles spawned and not yet finished, oldest first.
    pub fn active_cycles(&self) -> Vec<CycleId> {
        self.active().keys().copied().collect()
    }

    /// Cancel every running or queued cycle. Periodic firing continues.
    pub fn cancel_all(&self) {
        for token in self.active().values() {
            token.cancel();
        }
    }

    /// Start one cycle now on a background task. Never blocks the caller.
    ///
    /// Returns `None` when the overlap policy is [`OverlapPolicy::Skip`] and a cycle is already
    /// in flight, when [`OverlapPolicy::Queue`] already has a request waiting, or when the
    /// trigger has been shut down.
    pub fn run_now(&self) -> Option<CycleHandle> {
        if self.inner.shutdown.is_cancelled() {
            log::debug!("sync requested after shutdown; ignoring");
            return None;
        }

        let admission = match self.inner.policy {
            OverlapPolicy::Allow => Admission::Now(None),
            OverlapPolicy::Skip => match self.inner.gate.clone().try_lock_owned() {
                Ok(permit) => Admission::Now(Some(permit)),
                Err(_) => {
                    log::info!("⏭️ Sync already in progress; skipping this trigger");
                    return None;
                }
            },
            OverlapPolicy::Queue => match self.inner.gate.clone().try_lock_owned() {
                Ok(permit) => Admission::Now(Some(permit)),
                Err(_) if self.inner.queued.swap(true, Ordering::AcqRel) => {
                    log::info!("⏭️ Sync already in progress and one is queued; skipping this trigger");
                    return None;
                }
                Err(_) => {
                    log::info!("⏳ Sync already in progress; queued to run next");
                    Admission::AfterActive
                }
            },
        };

        let id = CycleId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = self.inner.shutdown.child_token();
        self.active().insert(id, cancel.clone());

        let trigger = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let permit = match admission {
                Admission::Now(permit) => permit,
                Admission::AfterActive => {
                    let gate = trigger.inner.gate.clone();
                    let waited = tokio::select! {
                        biased;
                        _ = task_cancel.cancelled() => None,
                        permit = gate.lock_owned() => Some(permit),
                    };
                    trigger.inner.queued.store(false, Ordering::Release);
                    match waited {
                        Some(permit) => Some(permit),
                        None => {
                            let cancelled = SyncError::Cancelled {
                                completed: 0,
                                total: 0,
                            };
                            return trigger.finish(id, Err(cancelled));
                        }
                    }
                }
            };
            let result = trigger.execute(id, &task_cancel).await;
            drop(permit);
            result
        });

        Some(CycleHandle { id, cancel, task })
    }

    async fn execute(&self, id: CycleId, cancel: &CancellationToken) -> Result<CycleReport, SyncError> {
        log::info!("🔄 Sync cycle {} started", id);
        let result = self.inner.sync.run(id, cancel).await;
        self.finish(id, result)
    }

    /// Surface a cycle's error on the log and the bus, then forget the cycle.
    fn finish(
        &self,
        id: CycleId,
        result: Result<CycleReport, SyncError>,
    ) -> Result<CycleReport, SyncError> {
        if let Err(e) = &result {
            match e {
                SyncError::Cancelled { .. } => log::warn!("Sync cycle {} cancelled: {}", id, e),
                _ => log::error!("Sync cycle {} failed: {}", id, e),
            }
            self.inner.sync.bus().failed(id, e.to_string());
        }

        self.active().remove(&id);
        result
    }

    /// Fire a cycle every `interval`, the first one immediately, until shutdown.
    pub fn start_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let trigger = self.clone();
        let shutdown = self.inner.shutdown.clone();

        tokio::spawn(async move {
            log::info!("⏱️ Periodic sync every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        trigger.run_now();
                    }
                }
            }
            log::info!("⏹️ Periodic sync stopped");
        })
    }

    /// Stop periodic firing and cancel all cycles.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}
