use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{
    models::{
        ErrorResponse, HealthResponse, NewPostRequest, PostCreatedResponse, PostsResponse,
        SyncAcceptedResponse,
    },
    AppState,
};

fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn list_posts(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list() {
        Ok(posts) => Json(PostsResponse {
            count: posts.len(),
            posts,
        })
        .into_response(),
        Err(err) => {
            log::error!("Failed to list posts: {}", err);
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list posts")
        }
    }
}

pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let id: i64 = match id.parse() {
        Ok(id) => id,
        Err(err) => {
            log::warn!("Invalid post id {}: {}", id, err);
            return error(StatusCode::BAD_REQUEST, "invalid post id");
        }
    };
    match state.store.get(id) {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => error(StatusCode::NOT_FOUND, format!("post {id} not found")),
        Err(err) => {
            log::error!("Failed to load post {}: {}", id, err);
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load post")
        }
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<NewPostRequest>,
) -> impl IntoResponse {
    let user_id = match req.user_id {
        Some(user_id) if !req.title.trim().is_empty() && !req.body.trim().is_empty() => user_id,
        _ => return error(StatusCode::BAD_REQUEST, "all fields are required"),
    };
    match state.store.insert_new(user_id, &req.title, &req.body) {
        Ok(id) => {
            log::info!("📝 Added post {}", id);
            (StatusCode::CREATED, Json(PostCreatedResponse { id })).into_response()
        }
        Err(err) => {
            log::error!("Failed to add post: {}", err);
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to add post")
        }
    }
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id: i64 = match id.parse() {
        Ok(id) => id,
        Err(err) => {
            log::warn!("Invalid post id {}: {}", id, err);
            return error(StatusCode::BAD_REQUEST, "invalid post id");
        }
    };
    match state.store.delete(id) {
        Ok(true) => {
            log::info!("🗑️ Deleted post {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error(StatusCode::NOT_FOUND, format!("post {id} not found")),
        Err(err) => {
            log::error!("Failed to delete post {}: {}", id, err);
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to delete post")
        }
    }
}

pub async fn sync_now(State(state): State<AppState>) -> impl IntoResponse {
    match state.trigger.run_now() {
        Some(handle) => (
            StatusCode::ACCEPTED,
            Json(SyncAcceptedResponse {
                cycle: handle.id().0,
            }),
        )
            .into_response(),
        None => error(StatusCode::CONFLICT, "sync already in progress"),
    }
}

pub async fn sync_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.status.snapshot())
}

pub async fn not_found() -> impl IntoResponse {
    error(StatusCode::NOT_FOUND, "not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::fetcher::{FetchError, Fetcher};
    use crate::rest::router;
    use crate::status::SyncStatus;
    use crate::storage::{SqliteStore, Store};
    use crate::synchronizer::Synchronizer;
    use crate::trigger::{OverlapPolicy, Trigger};
    use crate::types::Record;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    /// Never answers, so a started cycle stays in flight.
    struct PendingFetcher;

    #[async_trait]
    impl Fetcher for PendingFetcher {
        async fn fetch(&self) -> Result<Vec<Record>, FetchError> {
            std::future::pending().await
        }

        fn source(&self) -> &str {
            "pending"
        }
    }

    fn test_state(prefix: &str) -> (AppState, Arc<SqliteStore>) {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("{}_{}_{}.db", prefix, std::process::id(), nanos));
        let store = Arc::new(SqliteStore::open(&p).unwrap());

        let sync = Synchronizer::new(store.clone(), Arc::new(PendingFetcher), EventBus::new());
        let trigger = Trigger::new(sync, OverlapPolicy::Skip, CancellationToken::new());
        let state = AppState {
            store: store.clone(),
            trigger,
            status: SyncStatus::new(),
            started_at: SystemTime::now(),
        };
        (state, store)
    }

    async fn send(state: AppState, method: &str, uri: &str) -> axum::response::Response {
        router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn send_json(state: AppState, uri: &str, body: serde_json::Value) -> axum::response::Response {
        router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (state, _) = test_state("postsync_rest_health");
        let response = send(state, "GET", "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json.get("uptime_secs").is_some());
    }

    #[tokio::test]
    async fn list_posts_returns_rows_in_id_order() {
        let (state, store) = test_state("postsync_rest_list");
        store.upsert_one(&Record::new(2, 1, "b", "")).unwrap();
        store.upsert_one(&Record::new(1, 1, "a", "")).unwrap();

        let response = send(state, "GET", "/posts").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let payload: PostsResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.count, 2);
        assert_eq!(payload.posts[0].id, 1);
        assert_eq!(payload.posts[1].title, "b");
    }

    #[tokio::test]
    async fn get_post_handles_found_missing_and_invalid() {
        let (state, store) = test_state("postsync_rest_get");
        store.upsert_one(&Record::new(5, 3, "five", "body")).unwrap();

        let found = send(state.clone(), "GET", "/posts/5").await;
        assert_eq!(found.status(), StatusCode::OK);
        let json = body_json(found).await;
        assert_eq!(json["userId"], 3);
        assert_eq!(json["title"], "five");

        let missing = send(state.clone(), "GET", "/posts/6").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid = send(state, "GET", "/posts/abc").await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_post_assigns_next_id() {
        let (state, store) = test_state("postsync_rest_create");
        store.upsert_one(&Record::new(100, 1, "synced", "b")).unwrap();

        let response = send_json(
            state,
            "/posts",
            serde_json::json!({"userId": 4, "title": "mine", "body": "typed"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_i64().unwrap();
        assert_eq!(id, 101);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.user_id, 4);
        assert_eq!(stored.title, "mine");
    }

    #[tokio::test]
    async fn create_post_requires_every_field() {
        let (state, store) = test_state("postsync_rest_create_bad");

        for body in [
            serde_json::json!({"title": "t", "body": "b"}),
            serde_json::json!({"userId": 1, "title": "  ", "body": "b"}),
            serde_json::json!({"userId": 1, "title": "t"}),
        ] {
            let response = send_json(state.clone(), "/posts", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_post_removes_once() {
        let (state, store) = test_state("postsync_rest_delete");
        store.upsert_one(&Record::new(9, 1, "nine", "b")).unwrap();

        let first = send(state.clone(), "DELETE", "/posts/9").await;
        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert!(store.get(9).unwrap().is_none());

        let again = send(state.clone(), "DELETE", "/posts/9").await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);

        let invalid = send(state, "DELETE", "/posts/nine").await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sync_now_accepts_then_conflicts_while_in_flight() {
        let (state, _) = test_state("postsync_rest_sync");

        let first = send(state.clone(), "POST", "/sync").await;
        assert_eq!(first.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(first).await["cycle"], 1);

        let second = send(state.clone(), "POST", "/sync").await;
        assert_eq!(second.status(), StatusCode::CONFLICT);

        state.trigger.shutdown();
    }

    #[tokio::test]
    async fn sync_status_starts_idle() {
        let (state, _) = test_state("postsync_rest_status");
        let response = send(state, "GET", "/sync/status").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["state"], "idle");
        assert_eq!(json["completedCycles"], 0);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (state, _) = test_state("postsync_rest_404");
        let response = send(state, "GET", "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
