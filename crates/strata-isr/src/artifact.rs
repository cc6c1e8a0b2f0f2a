//! Rendered artifacts and cache statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A rendered page kept in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// The rendered HTML
    pub html: String,

    /// Data the HTML was rendered from, kept so later renders can reuse it
    #[serde(default)]
    pub props: Option<Value>,

    /// When the artifact was generated
    pub generated_at: DateTime<Utc>,

    /// Revalidation interval; `None` means the artifact never goes stale
    pub revalidate_after: Option<Duration>,

    /// Bookkeeping about the artifact
    #[serde(default)]
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    /// Create an artifact generated now
    pub fn new(html: impl Into<String>, revalidate_after: Option<Duration>) -> Self {
        let html = html.into();
        let metadata = ArtifactMetadata {
            size_bytes: html.len(),
            ..ArtifactMetadata::default()
        };

        Self {
            html,
            props: None,
            generated_at: Utc::now(),
            revalidate_after,
            metadata,
        }
    }

    /// Attach the data the artifact was rendered from
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }

    /// Override the generation timestamp
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Age of the artifact
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.generated_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Check whether the revalidation interval has elapsed
    pub fn is_stale(&self) -> bool {
        match self.revalidate_after {
            Some(interval) => self.age() >= interval,
            None => false,
        }
    }

    pub fn is_fresh(&self) -> bool {
        !self.is_stale()
    }
}

/// Metadata about an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArtifactMetadata {
    /// Number of times this artifact replaced an earlier one
    pub regenerations: u64,

    /// Last time the artifact was swapped in by a revalidation
    pub last_revalidated: Option<DateTime<Utc>>,

    /// Size of the HTML in bytes
    pub size_bytes: usize,
}

impl ArtifactMetadata {
    /// Carry bookkeeping over from the artifact being replaced
    pub fn succeed(&mut self, previous: &ArtifactMetadata) {
        self.regenerations = previous.regenerations + 1;
        self.last_revalidated = Some(Utc::now());
    }
}

/// How a lookup was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served a fresh artifact
    Hit,
    /// Served an expired artifact while a refresh runs in the background
    Stale,
    /// Nothing stored, generated on the spot
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Statistics for the artifact store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    /// Fresh artifacts served
    pub hits: u64,

    /// Stale artifacts served
    pub stale_hits: u64,

    /// Lookups that found nothing
    pub misses: u64,

    /// Background or on-demand refreshes that swapped in a new artifact
    pub regenerations: u64,

    /// Refreshes that failed and left the old artifact in place
    pub failed_regenerations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_without_interval_never_stale() {
        let artifact = Artifact::new("<h1>A</h1>", None)
            .generated_at(Utc::now() - chrono::Duration::days(365));
        assert!(artifact.is_fresh());
    }

    #[test]
    fn test_artifact_goes_stale_after_interval() {
        let fresh = Artifact::new("x", Some(Duration::from_secs(10)));
        assert!(fresh.is_fresh());

        let old = fresh.generated_at(Utc::now() - chrono::Duration::seconds(11));
        assert!(old.is_stale());
    }

    #[test]
    fn test_metadata_size_and_succession() {
        let first = Artifact::new("abcd", None);
        assert_eq!(first.metadata.size_bytes, 4);

        let mut second = Artifact::new("ab", None);
        second.metadata.succeed(&first.metadata);
        assert_eq!(second.metadata.regenerations, 1);
        assert!(second.metadata.last_revalidated.is_some());
    }
}
