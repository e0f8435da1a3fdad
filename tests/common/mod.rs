use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use postsync::{HttpFetcher, Record};
use url::Url;

#[derive(Clone)]
pub enum Reply {
    Posts(String),
    Status(StatusCode),
}

/// Local stand-in for the remote posts endpoint. The reply can be swapped between requests.
#[derive(Clone)]
pub struct RemoteSource {
    pub addr: SocketAddr,
    reply: Arc<Mutex<Reply>>,
}

impl RemoteSource {
    pub async fn start(reply: Reply) -> Self {
        let reply = Arc::new(Mutex::new(reply));
        let router = Router::new()
            .route("/posts", get(serve_posts))
            .with_state(reply.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, reply }
    }

    pub fn set(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/posts", self.addr)).unwrap()
    }

    pub fn fetcher(&self) -> HttpFetcher {
        HttpFetcher::new(self.url(), Duration::from_secs(5)).unwrap()
    }
}

async fn serve_posts(State(reply): State<Arc<Mutex<Reply>>>) -> impl IntoResponse {
    let reply = reply.lock().unwrap().clone();
    match reply {
        Reply::Posts(body) => (StatusCode::OK, body).into_response(),
        Reply::Status(status) => (status, "unavailable").into_response(),
    }
}

pub fn posts_json(records: &[Record]) -> Reply {
    Reply::Posts(serde_json::to_string(records).unwrap())
}

pub fn post(id: i64, title: &str) -> Record {
    Record::new(id, 1, title, format!("body of {id}"))
}
