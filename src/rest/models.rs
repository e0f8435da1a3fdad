use serde::{Deserialize, Serialize};

use crate::types::Record;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub count: usize,
    pub posts: Vec<Record>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAcceptedResponse {
    pub cycle: u64,
}

/// Body of `POST /posts`. Missing fields decode as empty and are rejected by the handler.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPostRequest {
    pub user_id: Option<i64>,
    pub title: String,
    pub body: String,
}

#[derive(Serialize, Deserialize)]
pub struct PostCreatedResponse {
    pub id: i64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
