use std::time::Duration;

use async_trait::async_trait;
use url::Url;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("timeout fetching {0}")]
    Timeout(String),
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response too large (>{max_bytes} bytes)")]
    TooLarge { max_bytes: usize },
    #[error("fetch error: {0}")]
    Other(String),
}

/// Downloads remote recipe documents.
#[async_trait]
pub trait RecipeFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("scaffold-exec/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            timeout: Duration::from_secs(30),
            max_bytes: 4 * 1024 * 1024,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl RecipeFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|e| map_reqwest_error(url, e))?;
        if body.len() > self.max_bytes {
            return Err(FetchError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        String::from_utf8(body.to_vec()).map_err(|e| FetchError::Other(e.to_string()))
    }
}

fn map_reqwest_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout(url.to_string());
    }
    if e.is_connect() || e.is_request() {
        return FetchError::Network(e.to_string());
    }
    FetchError::Other(e.to_string())
}
