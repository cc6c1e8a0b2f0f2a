//! In-memory storage backend

use crate::artifact::Artifact;
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage backend
///
/// Artifacts are held behind `Arc` so a swap only exchanges pointers while
/// the write lock is held. Lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    artifacts: Arc<RwLock<HashMap<String, Arc<Artifact>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Artifact>> {
        let artifacts = self.artifacts.read().await;
        Ok(artifacts.get(key).map(|artifact| Artifact::clone(artifact)))
    }

    async fn set(&self, key: &str, artifact: Artifact) -> Result<()> {
        let artifact = Arc::new(artifact);
        self.artifacts.write().await.insert(key.to_string(), artifact);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.artifacts.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.artifacts.read().await.contains_key(key))
    }

    async fn clear(&self) -> Result<()> {
        self.artifacts.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.artifacts.read().await.keys().cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();

        storage.set("/blog", Artifact::new("<h2>A</h2>", None)).await.unwrap();

        let retrieved = storage.get("/blog").await.unwrap();
        assert_eq!(retrieved.unwrap().html, "<h2>A</h2>");

        assert!(storage.exists("/blog").await.unwrap());
        assert!(!storage.exists("/news").await.unwrap());

        storage.delete("/blog").await.unwrap();
        assert!(!storage.exists("/blog").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage_swap_replaces_whole_artifact() {
        let storage = MemoryStorage::new();

        storage.set("/news", Artifact::new("old", None)).await.unwrap();
        storage.set("/news", Artifact::new("newer", None)).await.unwrap();

        let current = storage.get("/news").await.unwrap().unwrap();
        assert_eq!(current.html, "newer");
        assert_eq!(current.metadata.size_bytes, 5);
        assert_eq!(storage.keys().await.unwrap(), vec!["/news".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_storage_clear_and_keys() {
        let storage = MemoryStorage::new();

        storage.set("/a", Artifact::new("a", None)).await.unwrap();
        storage.set("/b", Artifact::new("b", None)).await.unwrap();

        let mut keys = storage.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/a".to_string(), "/b".to_string()]);

        storage.clear().await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
