mod wiring;

use crate::events::{EventBus, EventFilter, SyncObserver};
use crate::types::CycleId;
use crate::{cli, context, rest, status, storage};
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use wiring::{build_synchronizer, build_trigger};

pub struct App {
    pub ctx: context::Context,
    pub store: Arc<dyn storage::Store + Send + Sync>,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::init(ctx.log_file.as_deref().map(Path::new));
        log::info!("🚀 Starting postsync");
        log::info!("🔗 Source URL: {}", ctx.source_url);
        log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let store = wiring::init_storage(&ctx)?;

        Ok((Self { ctx, store }, cli))
    }
}

/// Re-reads the store after every completed cycle, standing in for a view refresh.
struct StoreReloader {
    store: Arc<dyn storage::Store + Send + Sync>,
}

impl SyncObserver for StoreReloader {
    fn on_progress(&mut self, cycle: CycleId, percent: u8) {
        log::debug!("Cycle {} progress {}%", cycle, percent);
    }

    fn on_completed(&mut self, cycle: CycleId) {
        match self.store.count() {
            Ok(n) => log::info!("📚 Cycle {} done; store holds {} posts", cycle, n),
            Err(e) => log::error!("Reload after cycle {} failed: {}", cycle, e),
        }
    }
}

fn spawn_reloader(bus: &EventBus, store: Arc<dyn storage::Store + Send + Sync>) -> JoinHandle<()> {
    let subscription = bus.subscribe(EventFilter::All);
    tokio::spawn(async move {
        let mut reloader = StoreReloader { store };
        subscription.dispatch(&mut reloader).await;
    })
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!("🌐 REST API: http://{}", app.ctx.api_listen);
    log::info!("⏱️ Sync interval: {:?}", app.ctx.interval);
    log::info!("🔀 Overlap policy: {:?}", app.ctx.overlap);
    if let Some(path) = app.ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path);
    }

    let shutdown = CancellationToken::new();
    let bus = EventBus::new();

    let trigger = build_trigger(&app.ctx, app.store.clone(), bus.clone(), shutdown.clone())?;

    let sync_status = status::SyncStatus::new();
    let status_task = sync_status.track(&bus);
    let reloader_task = spawn_reloader(&bus, app.store.clone());

    // REST
    let api_addr = app.ctx.api_listen;
    let rest_state = rest::AppState {
        store: app.store.clone(),
        trigger: trigger.clone(),
        status: sync_status,
        started_at: std::time::SystemTime::now(),
    };
    let rest_shutdown = shutdown.clone();
    let mut rest_handle = tokio::spawn(async move {
        if let Err(e) = rest::serve(api_addr, rest_state, rest_shutdown).await {
            log::error!("REST server error: {:#}", e);
        }
    });

    // Sync
    let mut periodic_handle = trigger.start_periodic(app.ctx.interval);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
        }
        _ = &mut rest_handle => log::error!("REST task exited unexpectedly"),
        _ = &mut periodic_handle => log::error!("Periodic sync task exited unexpectedly"),
    }

    shutdown.cancel();
    trigger.cancel_all();

    let mut fatal_error: Option<anyhow::Error> = None;
    if !rest_handle.is_finished() {
        if let Err(e) = rest_handle.await {
            log::error!("REST server error: {}", e);
            fatal_error = Some(e.into());
        }
    }
    if !periodic_handle.is_finished() {
        if let Err(e) = periodic_handle.await {
            log::error!("Periodic sync error: {}", e);
            fatal_error.get_or_insert(e.into());
        }
    }
    status_task.abort();
    reloader_task.abort();

    if let Some(e) = fatal_error {
        return Err(e);
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        return cmd.run(&app).await;
    }

    run_daemon(app).await
}
