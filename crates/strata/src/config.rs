// File: src/config.rs
// Purpose: Configuration parsing from strata.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_isr::IsrTomlConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub isr: IsrTomlConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Prefix hydrated regions are served under
    #[serde(default = "default_hydrate_prefix")]
    pub hydrate_prefix: String,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Outbound fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL relative endpoint paths resolve against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout; unset means no timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// JSON file of canned responses; when set, no network calls are made
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// Default values
fn default_name() -> String {
    "strata-app".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_hydrate_prefix() -> String {
    crate::resolver::DEFAULT_HYDRATE_PREFIX.to_string()
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_base_url() -> String {
    "https://api.example.com".to_string()
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            hydrate_prefix: default_hydrate_prefix(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            fixtures: None,
        }
    }
}

impl Config {
    /// Load configuration from a strata.toml file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Apply environment overrides (STRATA_PORT, STRATA_API_URL)
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = std::env::var("STRATA_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(base_url) = std::env::var("STRATA_API_URL") {
            self.fetch.base_url = base_url;
        }
        self
    }
}
