//! HTTP implementation of [`Fetch`] using `reqwest`.

use crate::{Fetch, TransportError};

/// An HTTP-backed [`Fetch`] wrapping a shared `reqwest::Client`.
///
/// Cheap to clone — `reqwest::Client` holds its connection pool behind
/// an `Arc` internally, so clones share the pool.
#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
    client: reqwest::Client,
}

impl HttpFetch {
    /// Creates a fetcher with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher around a caller-configured client
    /// (custom timeouts, proxies, user agent, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Issues a GET and rejects non-success statuses.
    async fn get(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        tracing::debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

impl Fetch for HttpFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        self.get(url).await?.text().await.map_err(TransportError::Http)
    }

    async fn fetch_json(
        &self,
        url: &str,
    ) -> Result<serde_json::Value, TransportError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
