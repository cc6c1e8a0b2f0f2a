use pretty_assertions::assert_eq;
use std::time::Duration;
use strata_isr::{Artifact, ArtifactStore, CacheStatus, FilesystemConfig, IsrConfig, StorageBackend};
use tempfile::TempDir;

fn filesystem_config(dir: &TempDir) -> IsrConfig {
    IsrConfig {
        default_revalidate: Duration::from_secs(60),
        storage: StorageBackend::Filesystem(FilesystemConfig {
            path: dir.path().to_path_buf(),
            max_size_mb: 10,
        }),
        fallback: None,
    }
}

#[tokio::test]
async fn test_artifacts_survive_restart() {
    let dir = TempDir::new().unwrap();

    let store = ArtifactStore::new(filesystem_config(&dir)).await.unwrap();
    assert_eq!(store.storage_name(), "filesystem");
    let served = store
        .get_or_generate("/blog", || async {
            Ok::<_, anyhow::Error>(Artifact::new("<h2>A</h2>", None))
        })
        .await
        .unwrap();
    assert_eq!(served.status, CacheStatus::Miss);
    drop(store);

    let reopened = ArtifactStore::new(filesystem_config(&dir)).await.unwrap();
    let served = reopened
        .get_or_generate("/blog", || async {
            Ok::<_, anyhow::Error>(Artifact::new("regenerated", None))
        })
        .await
        .unwrap();
    assert_eq!(served.status, CacheStatus::Hit);
    assert_eq!(served.artifact.html, "<h2>A</h2>");
}

#[tokio::test]
async fn test_swap_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(filesystem_config(&dir)).await.unwrap();

    for html in ["one", "two", "three"] {
        store
            .regenerate("/news", || async move {
                Ok::<_, anyhow::Error>(Artifact::new(html, Some(Duration::from_secs(10))))
            })
            .await
            .unwrap();
    }

    let current = store.get("/news").await.unwrap().unwrap();
    assert_eq!(current.html, "three");
    assert_eq!(current.metadata.regenerations, 2);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().map_or(false, |ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
    assert_eq!(store.keys().await.unwrap(), vec!["/news".to_string()]);
}
