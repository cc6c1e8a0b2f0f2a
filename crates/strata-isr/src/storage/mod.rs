//! Storage backends for the artifact store

use crate::artifact::Artifact;
use anyhow::Result;
use async_trait::async_trait;

pub mod memory;

#[cfg(feature = "filesystem")]
pub mod filesystem;

/// Trait for artifact storage backends
///
/// `set` must replace an existing entry atomically: a concurrent `get`
/// observes either the previous artifact or the new one in full.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get an artifact by key
    async fn get(&self, key: &str) -> Result<Option<Artifact>>;

    /// Store or replace an artifact
    async fn set(&self, key: &str, artifact: Artifact) -> Result<()>;

    /// Delete an artifact
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove every artifact
    async fn clear(&self) -> Result<()>;

    /// Get all keys
    async fn keys(&self) -> Result<Vec<String>>;

    /// Get storage backend name
    fn name(&self) -> &'static str;
}
