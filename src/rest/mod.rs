use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::status::SyncStatus;
use crate::storage::Store;
use crate::trigger::Trigger;

mod handlers;
mod models;

pub use models::{
    ErrorResponse, HealthResponse, NewPostRequest, PostCreatedResponse, PostsResponse,
    SyncAcceptedResponse,
};

use handlers::{
    create_post, delete_post, get_post, health, list_posts, not_found, sync_now, sync_status,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store + Send + Sync>,
    pub trigger: Trigger,
    pub status: SyncStatus,
    pub started_at: std::time::SystemTime,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).delete(delete_post))
        .route("/sync", post(sync_now))
        .route("/sync/status", get(sync_status))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
