//! # Strata Fetch
//!
//! The data fetcher shared by every render strategy.
//!
//! - `FetchRequest` - URL plus ordered query parameters
//! - `Fetcher` - one outbound call per invocation, parsed JSON out
//! - `HttpFetcher` - reqwest-backed implementation
//! - `FixtureFetcher` - canned responses for offline development and tests
//!
//! No retries are performed; callers that want them wrap a `Fetcher`.
//!
//! ## Example
//!
//! ```no_run
//! use strata_fetch::{Fetcher, FetchRequest, HttpFetcher};
//!
//! # async fn run() -> Result<(), strata_fetch::FetchError> {
//! let fetcher = HttpFetcher::new();
//! let request = FetchRequest::new("https://api.example.com/posts")
//!     .query("limit", 1)
//!     .query("offset", 0);
//! let posts = fetcher.fetch(&request).await?;
//! # let _ = posts;
//! # Ok(())
//! # }
//! ```

mod error;
mod fixture;
mod http;
mod request;

pub use error::FetchError;
pub use fixture::FixtureFetcher;
pub use http::HttpFetcher;
pub use request::FetchRequest;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Performs a single JSON fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `request` and return the parsed JSON body.
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        (**self).fetch(request).await
    }
}
