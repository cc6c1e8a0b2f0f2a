// File: src/build.rs
// Purpose: Pre-render build-time pages to static files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strata::{BuildReport, Resolver};
use tracing::info;

/// Where a route's document lands under `out_dir`
pub fn output_path(out_dir: &Path, route: &str) -> PathBuf {
    let mut path = out_dir.to_path_buf();
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

/// Build every build-time page and write it to `out_dir/<route>/index.html`
///
/// Request-time and client-only pages are skipped. The first failing page
/// aborts the build.
pub async fn write_site(resolver: &Resolver, out_dir: &Path) -> Result<BuildReport> {
    let report = resolver.build().await?;

    for built in &report.pages {
        let artifact = resolver
            .store()
            .get(&built.route)
            .await?
            .with_context(|| format!("No artifact stored for {}", built.route))?;

        let path = output_path(out_dir, &built.route);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        tokio::fs::write(&path, artifact.html.as_bytes())
            .await
            .with_context(|| format!("Failed to write page: {:?}", path))?;

        info!(route = %built.route, path = ?path, bytes = built.bytes, "wrote page");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use strata::{ArtifactStore, Config, FixtureFetcher};
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        let out = Path::new("dist");
        assert_eq!(output_path(out, "/"), PathBuf::from("dist/index.html"));
        assert_eq!(output_path(out, "/blog"), PathBuf::from("dist/blog/index.html"));
        assert_eq!(output_path(out, "/docs/intro"), PathBuf::from("dist/docs/intro/index.html"));
    }

    #[tokio::test]
    async fn test_write_site_writes_build_time_pages() {
        let mut config = Config::default();
        config.fetch.base_url = "http://api.test".to_string();
        let fetcher = FixtureFetcher::new()
            .with_json("http://api.test/posts", json!([{"id": 1, "title": "A"}]));

        let resolver = Resolver::new(
            crate::site::pages(&config).unwrap(),
            Arc::new(fetcher),
            ArtifactStore::in_memory().await.unwrap(),
        );

        let dir = TempDir::new().unwrap();
        let report = write_site(&resolver, dir.path()).await.unwrap();

        let routes: Vec<&str> = report.pages.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(routes, vec!["/", "/blog", "/news"]);

        let blog = std::fs::read_to_string(dir.path().join("blog/index.html")).unwrap();
        assert!(blog.contains("<h2>A</h2>"));
        assert!(dir.path().join("index.html").exists());
        assert!(!dir.path().join("profile").exists());
        assert!(!dir.path().join("products").exists());
    }

    #[tokio::test]
    async fn test_write_site_aborts_on_fetch_failure() {
        let config = Config::default();
        let fetcher = FixtureFetcher::new();

        let resolver = Resolver::new(
            crate::site::pages(&config).unwrap(),
            Arc::new(fetcher),
            ArtifactStore::in_memory().await.unwrap(),
        );

        let dir = TempDir::new().unwrap();
        assert!(write_site(&resolver, dir.path()).await.is_err());
        assert!(!dir.path().join("index.html").exists());
    }
}
