//! Artifact store configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Artifact store configuration
#[derive(Debug, Clone)]
pub struct IsrConfig {
    /// Revalidation interval used when a page does not declare one
    pub default_revalidate: Duration,

    /// Primary storage backend
    pub storage: StorageBackend,

    /// Optional fallback storage backend
    pub fallback: Option<Box<StorageBackend>>,
}

impl Default for IsrConfig {
    fn default() -> Self {
        Self {
            default_revalidate: Duration::from_secs(60),
            storage: StorageBackend::Memory,
            fallback: None,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory storage (fast, non-persistent)
    Memory,

    /// Filesystem storage (persistent, single-instance)
    Filesystem(FilesystemConfig),
}

/// Filesystem storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Cache directory path
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Maximum cache size in megabytes
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".strata/cache")
}

fn default_max_size_mb() -> u64 {
    500
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_size_mb: default_max_size_mb(),
        }
    }
}

/// `[isr]` section of strata.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsrTomlConfig {
    /// Default revalidation period in seconds
    #[serde(default = "default_revalidate_secs")]
    pub default_revalidate: u64,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageTomlConfig,
}

fn default_revalidate_secs() -> u64 {
    60
}

impl Default for IsrTomlConfig {
    fn default() -> Self {
        Self {
            default_revalidate: default_revalidate_secs(),
            storage: StorageTomlConfig::default(),
        }
    }
}

/// `[isr.storage]` section of strata.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageTomlConfig {
    /// Primary storage backend: "memory" or "filesystem"
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Optional fallback storage backend
    #[serde(default)]
    pub fallback: Option<String>,

    /// Filesystem-specific config
    #[serde(default)]
    pub filesystem: Option<FilesystemConfig>,
}

fn default_primary() -> String {
    "memory".to_string()
}

impl Default for StorageTomlConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            fallback: None,
            filesystem: None,
        }
    }
}

impl IsrTomlConfig {
    /// Convert TOML config to runtime config
    pub fn to_runtime_config(&self) -> anyhow::Result<IsrConfig> {
        let storage = self.parse_storage_backend(&self.storage.primary)?;

        let fallback = if let Some(ref fallback_type) = self.storage.fallback {
            Some(Box::new(self.parse_storage_backend(fallback_type)?))
        } else {
            None
        };

        Ok(IsrConfig {
            default_revalidate: Duration::from_secs(self.default_revalidate),
            storage,
            fallback,
        })
    }

    fn parse_storage_backend(&self, backend_type: &str) -> anyhow::Result<StorageBackend> {
        match backend_type {
            "memory" => Ok(StorageBackend::Memory),
            "filesystem" => {
                let config = self.storage.filesystem.clone().unwrap_or_default();
                Ok(StorageBackend::Filesystem(config))
            }
            _ => Err(anyhow::anyhow!("Unknown storage backend: {}", backend_type)),
        }
    }
}
