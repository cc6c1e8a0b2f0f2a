//! Filesystem storage backend

use crate::artifact::Artifact;
use crate::config::FilesystemConfig;
use crate::storage::Storage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

const EXTENSION: &str = "json";

/// Filesystem storage backend
///
/// Stores artifacts as JSON files on disk. Each write lands in a fresh temp
/// file that is renamed over the target, so readers never see a half-written
/// artifact.
/// Persistent across restarts, suitable for single-instance deployments.
#[derive(Clone)]
pub struct FilesystemStorage {
    config: FilesystemConfig,
}

impl FilesystemStorage {
    /// Create a new filesystem storage backend
    pub async fn new(config: FilesystemConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)
            .await
            .context("Failed to create cache directory")?;

        Ok(Self { config })
    }

    /// File path for a key; keys are percent-encoded so they round-trip
    fn key_to_path(&self, key: &str) -> PathBuf {
        self.config
            .path
            .join(format!("{}.{}", urlencoding::encode(key), EXTENSION))
    }

    fn path_to_key(path: &std::path::Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        urlencoding::decode(stem).ok().map(|key| key.into_owned())
    }

    fn artifact_files(&self) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(&self.config.path)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
    }

    /// Cache directory size in bytes
    pub fn total_size_bytes(&self) -> u64 {
        self.artifact_files()
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    }

    /// Check if cache size exceeds maximum
    pub fn is_over_limit(&self) -> bool {
        self.total_size_bytes() > self.config.max_size_mb * 1024 * 1024
    }

    /// Evict least recently modified artifacts until under the limit
    pub async fn evict_if_needed(&self) -> Result<()> {
        if !self.is_over_limit() {
            return Ok(());
        }

        let mut entries: Vec<(PathBuf, SystemTime)> = self
            .artifact_files()
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((entry.into_path(), modified))
            })
            .collect();

        // Oldest first
        entries.sort_by_key(|(_, time)| *time);

        for (path, _) in entries {
            info!(path = %path.display(), "evicting cached artifact");
            fs::remove_file(&path).await.ok();

            if !self.is_over_limit() {
                break;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for FilesystemStorage {
    async fn get(&self, key: &str) -> Result<Option<Artifact>> {
        let path = self.key_to_path(key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read cache file"),
        };

        let artifact: Artifact =
            serde_json::from_str(&content).context("Failed to deserialize artifact")?;

        Ok(Some(artifact))
    }

    async fn set(&self, key: &str, artifact: Artifact) -> Result<()> {
        let path = self.key_to_path(key);
        let json = serde_json::to_string_pretty(&artifact).context("Failed to serialize artifact")?;

        // Each write gets its own temp file, so concurrent writers of one key never share one
        let dir = self.config.path.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir).context("Failed to create temp cache file")?;
            tmp.write_all(json.as_bytes())
                .context("Failed to write cache file")?;
            tmp.persist(&target).context("Failed to swap cache file")?;
            Ok(())
        })
        .await
        .context("Cache write task failed")??;
        debug!(key, path = %path.display(), "artifact written");

        self.evict_if_needed().await.ok();

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_to_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete cache file"),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(fs::try_exists(self.key_to_path(key)).await.unwrap_or(false))
    }

    async fn clear(&self) -> Result<()> {
        let paths: Vec<PathBuf> = self.artifact_files().map(|e| e.into_path()).collect();
        for path in paths {
            fs::remove_file(&path).await.ok();
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .artifact_files()
            .filter_map(|entry| Self::path_to_key(entry.path()))
            .collect())
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> FilesystemConfig {
        FilesystemConfig {
            path: dir.path().to_path_buf(),
            max_size_mb: 100,
        }
    }

    #[tokio::test]
    async fn test_filesystem_storage_basic() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(config(&temp_dir)).await.unwrap();

        storage.set("/blog", Artifact::new("<h2>A</h2>", None)).await.unwrap();

        let retrieved = storage.get("/blog").await.unwrap();
        assert_eq!(retrieved.unwrap().html, "<h2>A</h2>");
        assert!(storage.exists("/blog").await.unwrap());
        assert!(storage.get("/missing").await.unwrap().is_none());

        storage.delete("/blog").await.unwrap();
        assert!(!storage.exists("/blog").await.unwrap());
        storage.delete("/blog").await.unwrap();
    }

    #[tokio::test]
    async fn test_filesystem_keys_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(config(&temp_dir)).await.unwrap();

        storage.set("/", Artifact::new("home", None)).await.unwrap();
        storage.set("/blog/posts", Artifact::new("posts", None)).await.unwrap();

        let mut keys = storage.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/".to_string(), "/blog/posts".to_string()]);

        storage.clear().await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_one_key() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(config(&temp_dir)).await.unwrap();

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    for round in 0..20 {
                        let html = format!("<h2>{}-{}</h2>", writer, round);
                        storage.set("/news", Artifact::new(html, None)).await?;
                    }
                    Ok::<_, anyhow::Error>(())
                })
            })
            .collect();

        let reader = {
            let storage = storage.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    // Every read sees some complete artifact or none
                    storage.get("/news").await?;
                    tokio::task::yield_now().await;
                }
                Ok::<_, anyhow::Error>(())
            })
        };

        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        reader.await.unwrap().unwrap();

        let stored = storage.get("/news").await.unwrap().unwrap();
        assert!(stored.html.starts_with("<h2>"));
        assert_eq!(storage.keys().await.unwrap(), vec!["/news".to_string()]);
    }

    #[tokio::test]
    async fn test_filesystem_storage_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let storage = FilesystemStorage::new(config(&temp_dir)).await.unwrap();
            let artifact = Artifact::new("persistent", Some(std::time::Duration::from_secs(10)))
                .with_props(serde_json::json!({"id": 1}));
            storage.set("/news", artifact).await.unwrap();
        }

        // New instance simulates a restart
        {
            let storage = FilesystemStorage::new(config(&temp_dir)).await.unwrap();
            let retrieved = storage.get("/news").await.unwrap().unwrap();
            assert_eq!(retrieved.html, "persistent");
            assert_eq!(retrieved.props, Some(serde_json::json!({"id": 1})));
            assert_eq!(retrieved.revalidate_after, Some(std::time::Duration::from_secs(10)));
        }
    }
}
