use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::app::{build_synchronizer, App};
use crate::events::{EventBus, EventFilter, SyncObserver};
use crate::types::CycleId;

struct ProgressPrinter;

impl SyncObserver for ProgressPrinter {
    fn on_progress(&mut self, _cycle: CycleId, percent: u8) {
        eprint!("\rsyncing {:>3}%", percent);
    }

    fn on_completed(&mut self, _cycle: CycleId) {
        eprintln!();
    }
}

/// One cycle in the foreground; Ctrl-C cancels it between records.
pub async fn run(app: &App) -> Result<()> {
    let bus = EventBus::new();
    let subscription = bus.subscribe(EventFilter::All);
    let printer = tokio::spawn(async move {
        subscription.dispatch(&mut ProgressPrinter).await;
    });

    let sync = build_synchronizer(&app.ctx, app.store.clone(), bus)?;
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("🧨 Ctrl-C received, cancelling sync");
            ctrl_c_cancel.cancel();
        }
    });

    let result = sync.run(CycleId(1), &cancel).await;
    ctrl_c.abort();

    // Dropping the synchronizer closes the bus so the printer drains and exits.
    drop(sync);
    let _ = printer.await;

    let report = result.context("sync failed")?;
    println!(
        "fetched {} posts: {} new, {} already stored",
        report.total, report.inserted, report.ignored
    );
    Ok(())
}
