use std::sync::Arc;

use crate::{context, events, fetcher, storage, synchronizer, trigger};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)?;
    Ok(())
}

pub fn init_storage(ctx: &context::Context) -> Result<Arc<dyn storage::Store + Send + Sync>> {
    let db_path = ctx.db_path();
    if ctx.reset {
        log::warn!("🧹 Resetting store at {}", db_path.display());
        storage::SqliteStore::reset_all(&db_path).context("resetting storage")?;
    }
    let sqlite = storage::SqliteStore::open(&db_path).context("initializing storage")?;
    Ok(Arc::new(sqlite))
}

pub fn build_fetcher(ctx: &context::Context) -> Result<Arc<dyn fetcher::Fetcher>> {
    let fetcher = fetcher::HttpFetcher::new(ctx.source_url.clone(), ctx.fetch_timeout)
        .context("failed to create HTTP fetcher")?;
    Ok(Arc::new(fetcher))
}

pub fn build_synchronizer(
    ctx: &context::Context,
    store: Arc<dyn storage::Store + Send + Sync>,
    bus: events::EventBus,
) -> Result<synchronizer::Synchronizer> {
    let fetcher = build_fetcher(ctx)?;
    Ok(synchronizer::Synchronizer::new(store, fetcher, bus))
}

pub fn build_trigger(
    ctx: &context::Context,
    store: Arc<dyn storage::Store + Send + Sync>,
    bus: events::EventBus,
    shutdown: CancellationToken,
) -> Result<trigger::Trigger> {
    let sync = build_synchronizer(ctx, store, bus)?;
    Ok(trigger::Trigger::new(sync, ctx.overlap, shutdown))
}
