//! Artifact store core - keyed artifacts, atomic swaps and revalidation

use crate::artifact::{Artifact, CacheStatus, StoreStats};
use crate::config::{IsrConfig, StorageBackend};
use crate::storage::Storage;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a store lookup
#[derive(Debug)]
pub struct Served {
    /// The artifact handed to the caller
    pub artifact: Artifact,

    /// How the lookup was answered
    pub status: CacheStatus,

    /// Background refresh started by this lookup, if any
    pub refresh: Option<JoinHandle<()>>,
}

/// Keyed store of rendered artifacts
///
/// Cloning is cheap; clones share storage, statistics and refresh state.
#[derive(Clone)]
pub struct ArtifactStore {
    config: IsrConfig,
    primary_storage: Arc<dyn Storage>,
    fallback_storage: Option<Arc<dyn Storage>>,
    stats: Arc<RwLock<StoreStats>>,
    refreshing: Arc<Mutex<HashSet<String>>>,
    generation_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ArtifactStore {
    /// Create a new artifact store
    pub async fn new(config: IsrConfig) -> Result<Self> {
        let primary_storage = Self::create_storage(&config.storage).await?;

        let fallback_storage = if let Some(ref fallback_config) = config.fallback {
            Some(Self::create_storage(fallback_config).await?)
        } else {
            None
        };

        Ok(Self {
            config,
            primary_storage,
            fallback_storage,
            stats: Arc::new(RwLock::new(StoreStats::default())),
            refreshing: Arc::new(Mutex::new(HashSet::new())),
            generation_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// In-memory store with default settings
    pub async fn in_memory() -> Result<Self> {
        Self::new(IsrConfig::default()).await
    }

    /// Create a storage backend from config
    async fn create_storage(backend: &StorageBackend) -> Result<Arc<dyn Storage>> {
        match backend {
            StorageBackend::Memory => {
                use crate::storage::memory::MemoryStorage;
                Ok(Arc::new(MemoryStorage::new()))
            }
            #[cfg(feature = "filesystem")]
            StorageBackend::Filesystem(config) => {
                use crate::storage::filesystem::FilesystemStorage;
                let storage = FilesystemStorage::new(config.clone()).await?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "filesystem"))]
            StorageBackend::Filesystem(_) => {
                anyhow::bail!("Filesystem storage requires the 'filesystem' feature to be enabled")
            }
        }
    }

    /// Revalidation interval used when a page does not declare one
    pub fn default_revalidate(&self) -> Duration {
        self.config.default_revalidate
    }

    /// Name of the primary storage backend
    pub fn storage_name(&self) -> &'static str {
        self.primary_storage.name()
    }

    /// Serve an artifact, generating or refreshing it as needed
    ///
    /// Implements stale-while-revalidate:
    /// - fresh artifact: returned as is
    /// - stale artifact: returned as is, one background refresh per key swaps
    ///   in a new one; a failed refresh keeps the stale artifact
    /// - missing artifact: generated now; concurrent callers for the same key
    ///   wait for a single generation
    pub async fn get_or_generate<F, Fut, E>(&self, key: &str, generate: F) -> Result<Served, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Artifact, E>> + Send + 'static,
        E: From<anyhow::Error> + Display + Send + 'static,
    {
        if let Some(artifact) = self.get(key).await? {
            return Ok(self.serve_existing(key, artifact, generate).await);
        }

        let lock = self.generation_lock(key);
        let _generating = lock.lock().await;

        // Another caller may have generated it while we waited
        if let Some(artifact) = self.get(key).await? {
            return Ok(self.serve_existing(key, artifact, generate).await);
        }

        self.stats.write().await.misses += 1;
        debug!(key, "artifact miss, generating");

        let artifact = generate().await?;
        self.set(key, artifact.clone()).await?;

        Ok(Served {
            artifact,
            status: CacheStatus::Miss,
            refresh: None,
        })
    }

    async fn serve_existing<F, Fut, E>(&self, key: &str, artifact: Artifact, generate: F) -> Served
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Artifact, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if artifact.is_fresh() {
            self.stats.write().await.hits += 1;
            return Served {
                artifact,
                status: CacheStatus::Hit,
                refresh: None,
            };
        }

        self.stats.write().await.stale_hits += 1;

        let refresh = self.claim_refresh(key).map(|claim| {
            let store = self.clone();
            let key = key.to_string();
            debug!(key = %key, age = ?artifact.age(), "serving stale artifact, refreshing");

            let started = Utc::now();
            tokio::spawn(async move {
                let _claim = claim;
                match generate().await {
                    Ok(fresh) => match store.swap_unless_newer(&key, fresh, started).await {
                        Ok(true) => {}
                        Ok(false) => debug!(key = %key, "newer artifact stored during refresh, discarding"),
                        Err(e) => {
                            warn!(key = %key, error = %e, "failed to store refreshed artifact");
                            store.stats.write().await.failed_regenerations += 1;
                        }
                    },
                    Err(e) => {
                        warn!(key = %key, error = %e, "background refresh failed, keeping stale artifact");
                        store.stats.write().await.failed_regenerations += 1;
                    }
                }
            })
        });

        Served {
            artifact,
            status: CacheStatus::Stale,
            refresh,
        }
    }

    /// Regenerate an artifact now and swap it in
    ///
    /// On failure the existing artifact is left untouched.
    pub async fn regenerate<F, Fut, E>(&self, key: &str, generate: F) -> Result<Artifact, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Artifact, E>>,
        E: From<anyhow::Error>,
    {
        match generate().await {
            Ok(artifact) => {
                self.swap(key, artifact.clone()).await?;
                Ok(artifact)
            }
            Err(e) => {
                self.stats.write().await.failed_regenerations += 1;
                Err(e)
            }
        }
    }

    /// Swap in `artifact` unless the stored one was generated at or after `since`
    async fn swap_unless_newer(&self, key: &str, artifact: Artifact, since: DateTime<Utc>) -> Result<bool> {
        if let Some(current) = self.get(key).await? {
            if current.generated_at >= since {
                return Ok(false);
            }
        }
        self.swap(key, artifact).await?;
        Ok(true)
    }

    /// Replace an artifact, carrying over bookkeeping from the previous one
    pub async fn swap(&self, key: &str, mut artifact: Artifact) -> Result<()> {
        if let Some(previous) = self.get(key).await? {
            artifact.metadata.succeed(&previous.metadata);
            self.stats.write().await.regenerations += 1;
        }

        self.set(key, artifact).await?;
        info!(key, "artifact swapped");
        Ok(())
    }

    /// Get an artifact by key
    pub async fn get(&self, key: &str) -> Result<Option<Artifact>> {
        match self.primary_storage.get(key).await {
            Ok(Some(artifact)) => return Ok(Some(artifact)),
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "primary storage read failed"),
        }

        if let Some(ref fallback) = self.fallback_storage {
            if let Ok(Some(artifact)) = fallback.get(key).await {
                // Promote to primary storage
                self.primary_storage.set(key, artifact.clone()).await.ok();
                return Ok(Some(artifact));
            }
        }

        Ok(None)
    }

    /// Store an artifact without touching its bookkeeping
    pub async fn set(&self, key: &str, artifact: Artifact) -> Result<()> {
        self.primary_storage.set(key, artifact.clone()).await?;

        if let Some(ref fallback) = self.fallback_storage {
            fallback.set(key, artifact).await.ok();
        }

        Ok(())
    }

    /// Delete an artifact
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.primary_storage.delete(key).await?;

        if let Some(ref fallback) = self.fallback_storage {
            fallback.delete(key).await.ok();
        }

        Ok(())
    }

    /// Remove every artifact and reset statistics
    pub async fn clear(&self) -> Result<()> {
        self.primary_storage.clear().await?;

        if let Some(ref fallback) = self.fallback_storage {
            fallback.clear().await.ok();
        }

        *self.stats.write().await = StoreStats::default();

        Ok(())
    }

    /// Get all stored keys
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.primary_storage.keys().await
    }

    /// Get store statistics
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Whether a background refresh for `key` is running
    pub fn is_refreshing(&self, key: &str) -> bool {
        self.refreshing
            .lock()
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }

    fn claim_refresh(&self, key: &str) -> Option<RefreshClaim> {
        let mut refreshing = self.refreshing.lock().ok()?;
        if !refreshing.insert(key.to_string()) {
            return None;
        }
        Some(RefreshClaim {
            key: key.to_string(),
            refreshing: Arc::clone(&self.refreshing),
        })
    }

    fn generation_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        match self.generation_locks.lock() {
            Ok(mut locks) => Arc::clone(locks.entry(key.to_string()).or_default()),
            // A poisoned map only loses deduplication, not correctness
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Marks a key as refreshing until dropped
struct RefreshClaim {
    key: String,
    refreshing: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RefreshClaim {
    fn drop(&mut self) {
        if let Ok(mut refreshing) = self.refreshing.lock() {
            refreshing.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stale(html: &str) -> Artifact {
        Artifact::new(html, Some(Duration::from_secs(10)))
            .generated_at(Utc::now() - chrono::Duration::seconds(30))
    }

    #[tokio::test]
    async fn test_store_memory_backend() {
        let store = ArtifactStore::in_memory().await.unwrap();

        store.set("/blog", Artifact::new("test content", None)).await.unwrap();

        let retrieved = store.get("/blog").await.unwrap();
        assert_eq!(retrieved.unwrap().html, "test content");
        assert_eq!(store.storage_name(), "memory");

        store.delete("/blog").await.unwrap();
        assert!(store.get("/blog").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_miss_generates_then_hits() {
        let store = ArtifactStore::in_memory().await.unwrap();

        let served = store
            .get_or_generate("/blog", || async { Ok::<_, anyhow::Error>(Artifact::new("v1", None)) })
            .await
            .unwrap();
        assert_eq!(served.status, CacheStatus::Miss);

        let served = store
            .get_or_generate("/blog", || async { Ok::<_, anyhow::Error>(Artifact::new("v2", None)) })
            .await
            .unwrap();
        assert_eq!(served.status, CacheStatus::Hit);
        assert_eq!(served.artifact.html, "v1");

        let stats = store.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_failed_generation_stores_nothing() {
        let store = ArtifactStore::in_memory().await.unwrap();

        let result = store
            .get_or_generate("/blog", || async { Err::<Artifact, _>(anyhow::anyhow!("boom")) })
            .await;
        assert!(result.is_err());
        assert!(store.get("/blog").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_serves_old_and_refreshes_once() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store.set("/news", stale("old")).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let served = store
            .get_or_generate("/news", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(Artifact::new("new", Some(Duration::from_secs(10))))
            })
            .await
            .unwrap();

        assert_eq!(served.status, CacheStatus::Stale);
        assert_eq!(served.artifact.html, "old");

        served.refresh.expect("refresh should start").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let current = store.get("/news").await.unwrap().unwrap();
        assert_eq!(current.html, "new");
        assert_eq!(current.metadata.regenerations, 1);
        assert!(!store.is_refreshing("/news"));
    }

    #[tokio::test]
    async fn test_concurrent_stale_reads_share_one_refresh() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store.set("/news", stale("old")).await.unwrap();

        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let first = store
            .get_or_generate("/news", move || async move {
                gate.await.ok();
                Ok::<_, anyhow::Error>(Artifact::new("new", Some(Duration::from_secs(10))))
            })
            .await
            .unwrap();
        assert!(first.refresh.is_some());
        assert!(store.is_refreshing("/news"));

        let second = store
            .get_or_generate("/news", || async {
                Ok::<_, anyhow::Error>(Artifact::new("other", None))
            })
            .await
            .unwrap();
        assert_eq!(second.status, CacheStatus::Stale);
        assert_eq!(second.artifact.html, "old");
        assert!(second.refresh.is_none());

        release.send(()).unwrap();
        first.refresh.unwrap().await.unwrap();
        assert_eq!(store.get("/news").await.unwrap().unwrap().html, "new");
    }

    #[tokio::test]
    async fn test_slow_refresh_does_not_overwrite_newer_rebuild() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store.set("/news", stale("old")).await.unwrap();

        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let served = store
            .get_or_generate("/news", move || async move {
                gate.await.ok();
                Ok::<_, anyhow::Error>(Artifact::new("refreshed", Some(Duration::from_secs(10))))
            })
            .await
            .unwrap();
        let refresh = served.refresh.unwrap();

        store
            .regenerate("/news", || async {
                Ok::<_, anyhow::Error>(Artifact::new("rebuilt", Some(Duration::from_secs(10))))
            })
            .await
            .unwrap();

        release.send(()).unwrap();
        refresh.await.unwrap();

        assert_eq!(store.get("/news").await.unwrap().unwrap().html, "rebuilt");
        assert_eq!(store.stats().await.failed_regenerations, 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_artifact() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store.set("/news", stale("old")).await.unwrap();

        let served = store
            .get_or_generate("/news", || async { Err::<Artifact, _>(anyhow::anyhow!("upstream down")) })
            .await
            .unwrap();
        served.refresh.unwrap().await.unwrap();

        assert_eq!(store.get("/news").await.unwrap().unwrap().html, "old");
        assert_eq!(store.stats().await.failed_regenerations, 1);
    }

    #[tokio::test]
    async fn test_regenerate_on_demand() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store.set("/blog", Artifact::new("v1", None)).await.unwrap();

        store
            .regenerate("/blog", || async { Ok::<_, anyhow::Error>(Artifact::new("v2", None)) })
            .await
            .unwrap();
        assert_eq!(store.get("/blog").await.unwrap().unwrap().html, "v2");

        let failed = store
            .regenerate("/blog", || async { Err::<Artifact, _>(anyhow::anyhow!("nope")) })
            .await;
        assert!(failed.is_err());
        assert_eq!(store.get("/blog").await.unwrap().unwrap().html, "v2");
    }

    #[tokio::test]
    async fn test_clear_resets_stats() {
        let store = ArtifactStore::in_memory().await.unwrap();
        store
            .get_or_generate("/a", || async { Ok::<_, anyhow::Error>(Artifact::new("a", None)) })
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
        assert_eq!(store.stats().await, StoreStats::default());
    }
}
