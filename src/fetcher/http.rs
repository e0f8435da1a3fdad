use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use url::Url;

use super::{FetchError, Fetcher};
use crate::types::Record;

/// Fetches the posts collection with a single GET.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    url: Url,
}

impl HttpFetcher {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("postsync/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(format!("building HTTP client: {e}")))?;

        Ok(Self { client, url })
    }
}

pub(super) fn decode_batch(bytes: &[u8]) -> Result<Vec<Record>, FetchError> {
    serde_json::from_slice::<Vec<Record>>(bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<Record>, FetchError> {
        log::debug!("GET {}", self.url);
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "GET {} returned HTTP {}",
                self.url, status
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let records = decode_batch(&body)?;
        log::debug!("decoded {} records from {}", records.len(), self.url);
        Ok(records)
    }

    fn source(&self) -> &str {
        self.url.as_str()
    }
}
