mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Record;

pub use http::HttpFetcher;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Source of one remote record batch.
///
/// A call is all-or-nothing: either every record of the response, in source order, or an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>, FetchError>;

    /// Where the records come from, for logs.
    fn source(&self) -> &str;
}
