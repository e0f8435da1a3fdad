use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::events::EventBus;
use crate::fetcher::{FetchError, Fetcher};
use crate::storage::{Store, StoreError};
use crate::types::{progress_percent, CycleId, CycleReport, Record};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("store write failed at record {index} (id {id}): {source}")]
    Write {
        index: usize,
        id: i64,
        #[source]
        source: StoreError,
    },
    #[error("cycle cancelled after {completed} of {total} records")]
    Cancelled { completed: usize, total: usize },
    #[error("merge worker failed: {0}")]
    Worker(#[source] tokio::task::JoinError),
}

/// Drives one fetch→merge cycle and reports progress on the bus.
pub struct Synchronizer {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher>,
    bus: EventBus,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher>,
        bus: EventBus,
    ) -> Self {
        Self {
            store,
            fetcher,
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run one cycle.
    ///
    /// A failed fetch publishes nothing. A store error or cancellation stops the merge where it
    /// is: rows written before that point stay committed and no `Completed` is published.
    #[tracing::instrument(level = "info", skip_all, fields(cycle = %cycle))]
    pub async fn run(
        &self,
        cycle: CycleId,
        cancel: &CancellationToken,
    ) -> Result<CycleReport, SyncError> {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SyncError::Cancelled { completed: 0, total: 0 });
            }
            res = self.fetcher.fetch() => res?,
        };
        log::info!(
            "📥 Cycle {}: fetched {} records from {}",
            cycle,
            batch.len(),
            self.fetcher.source()
        );

        let store = self.store.clone();
        let bus = self.bus.clone();
        let cancel = cancel.clone();

        // SQLite is synchronous; keep the write loop off the async workers.
        let report = tokio::task::spawn_blocking(move || {
            merge(store.as_ref(), &bus, cycle, &batch, &cancel)
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                log::error!("💥 Cycle {}: merge worker panicked", cycle);
            } else {
                log::warn!("Cycle {}: merge worker was cancelled", cycle);
            }
            SyncError::Worker(e)
        })??;

        log::info!(
            "✅ Cycle {}: {} records, {} inserted, {} already present",
            cycle,
            report.total,
            report.inserted,
            report.ignored
        );
        Ok(report)
    }
}

/// Merge `batch` into `store` in source order, publishing one progress event per record.
///
/// Progress is tied to the position in the batch, not to the number of inserted rows.
pub fn merge(
    store: &(dyn Store + Send + Sync),
    bus: &EventBus,
    cycle: CycleId,
    batch: &[Record],
    cancel: &CancellationToken,
) -> Result<CycleReport, SyncError> {
    let total = batch.len();
    let mut report = CycleReport {
        total,
        ..CycleReport::default()
    };

    for (index, record) in batch.iter().enumerate() {
        if cancel.is_cancelled() {
            log::warn!("🛑 Cycle {} cancelled at {}/{}", cycle, index, total);
            return Err(SyncError::Cancelled {
                completed: index,
                total,
            });
        }

        let inserted = store.upsert_one(record).map_err(|source| {
            log::error!(
                "Cycle {}: store error at record {} (id {}): {}",
                cycle,
                index,
                record.id,
                source
            );
            SyncError::Write {
                index,
                id: record.id,
                source,
            }
        })?;

        if inserted {
            report.inserted += 1;
        } else {
            report.ignored += 1;
        }

        bus.progress(cycle, progress_percent(index + 1, total));
    }

    if cancel.is_cancelled() {
        log::warn!("🛑 Cycle {} cancelled before completion", cycle);
        return Err(SyncError::Cancelled {
            completed: total,
            total,
        });
    }

    bus.completed(cycle);
    Ok(report)
}
