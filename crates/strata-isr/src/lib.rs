//! # Strata ISR - artifact store with incremental regeneration
//!
//! Keeps rendered pages keyed by route and refreshes them on a schedule.
//!
//! ## Features
//!
//! - **Storage Backends**: Memory, Filesystem
//! - **Atomic Swap**: readers see the previous artifact or the new one, never a mix
//! - **Stale-While-Revalidate**: serve the expired artifact while one background task refreshes it
//! - **On-Demand Regeneration**: replace an artifact right away
//! - **Fallback Support**: primary + fallback storage
//!
//! ## Example
//!
//! ```rust
//! use strata_isr::{Artifact, ArtifactStore, IsrConfig, StorageBackend};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IsrConfig {
//!         default_revalidate: Duration::from_secs(60),
//!         storage: StorageBackend::Memory,
//!         fallback: None,
//!     };
//!
//!     let store = ArtifactStore::new(config).await?;
//!     let served = store
//!         .get_or_generate("/news", || async {
//!             Ok::<_, anyhow::Error>(Artifact::new("<h2>Hello</h2>", Some(Duration::from_secs(10))))
//!         })
//!         .await?;
//!     assert_eq!(served.artifact.html, "<h2>Hello</h2>");
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod storage;
pub mod store;

pub use artifact::{Artifact, ArtifactMetadata, CacheStatus, StoreStats};
pub use config::{FilesystemConfig, IsrConfig, IsrTomlConfig, StorageBackend};
pub use store::{ArtifactStore, Served};
