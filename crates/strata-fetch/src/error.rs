//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching JSON data.
///
/// Payloads are plain strings so the error can be cloned into every
/// render that observed it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The body was not valid JSON.
    #[error("malformed JSON from {url}: {message}")]
    Parse { url: String, message: String },

    /// The request URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status carried by the error, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
