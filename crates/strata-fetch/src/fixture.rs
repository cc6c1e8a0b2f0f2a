//! Canned-response fetcher for offline development and tests.

use crate::{FetchError, FetchRequest, Fetcher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
enum Fixture {
    Json(Value),
    Status(u16),
}

/// Serves fixed JSON bodies keyed by URL.
///
/// Lookup tries the full URL (with query string) first and falls back to
/// the URL without builder query parameters. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    fixtures: RwLock<HashMap<String, Fixture>>,
    /// Fetch count per (base URL, full URL)
    counts: RwLock<HashMap<(String, String), usize>>,
    delay: Option<Duration>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures from a JSON object mapping URL to response body.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file: {:?}", path))?;
        let entries: HashMap<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures file: {:?}", path))?;

        let fetcher = Self::new();
        for (url, body) in entries {
            fetcher.set_json(url, body);
        }
        Ok(fetcher)
    }

    /// Builder form of [`FixtureFetcher::set_json`].
    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.set_json(url, body);
        self
    }

    /// Builder form of [`FixtureFetcher::set_status`].
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.set_status(url, status);
        self
    }

    /// Delay every response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer `url` with `body`, replacing any previous fixture.
    pub fn set_json(&self, url: impl Into<String>, body: Value) {
        self.insert(url.into(), Fixture::Json(body));
    }

    /// Answer `url` with an error status.
    pub fn set_status(&self, url: impl Into<String>, status: u16) {
        self.insert(url.into(), Fixture::Status(status));
    }

    /// Number of fetches whose full URL or base URL equals `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .filter(|((base, full), _)| base == url || full == url)
                    .map(|(_, count)| count)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Number of fetches performed so far.
    pub fn total_calls(&self) -> usize {
        self.counts.read().map(|counts| counts.values().sum()).unwrap_or(0)
    }

    /// Number of distinct URLs fetched so far.
    pub fn distinct_urls(&self) -> usize {
        self.counts.read().map(|counts| counts.len()).unwrap_or(0)
    }

    fn insert(&self, url: String, fixture: Fixture) {
        if let Ok(mut fixtures) = self.fixtures.write() {
            fixtures.insert(url, fixture);
        }
    }

    fn lookup(&self, request: &FetchRequest, url: &str) -> Option<Fixture> {
        let fixtures = self.fixtures.read().ok()?;
        fixtures
            .get(url)
            .or_else(|| fixtures.get(request.base()))
            .cloned()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = request.url();
        debug!(%url, "serving fixture");

        if let Ok(mut counts) = self.counts.write() {
            *counts.entry((request.base().to_string(), url.clone())).or_default() += 1;
        }

        // Read the fixture before suspending so later updates don't leak into this call
        let fixture = self.lookup(request, &url);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match fixture {
            Some(Fixture::Json(body)) => Ok(body),
            Some(Fixture::Status(status)) => Err(FetchError::Status { status, url }),
            None => Err(FetchError::Status { status: 404, url }),
        }
    }
}
