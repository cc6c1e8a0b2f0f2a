//! reqwest-backed fetcher.

use crate::{FetchError, FetchRequest, Fetcher};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches JSON over HTTP.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with no timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = request.url();
        debug!(%url, "fetching");

        let parsed = reqwest::Url::parse(&url).map_err(|_| FetchError::InvalidUrl(url.clone()))?;

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "fetch failed");
                FetchError::Network {
                    url: url.clone(),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "fetch returned error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(%url, error = %e, "fetch returned malformed JSON");
            FetchError::Parse {
                url,
                message: e.to_string(),
            }
        })
    }
}
