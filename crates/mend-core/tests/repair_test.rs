//! End-to-end repair chains against files on disk.

use mend_core::{Cooldown, Error, FileStore, RepairConfig, RepairEngine};
use std::time::Duration;
use tempfile::TempDir;

fn config() -> RepairConfig {
    RepairConfig {
        max_retries: 2,
        retry_delay: Duration::from_millis(5),
        max_edits: 16,
    }
}

#[tokio::test]
async fn test_malformed_file_is_fixed_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("package.json");
    tokio::fs::write(
        &path,
        "{\n  \"name\": \"widget\",\n  \"version\": \"1.0.0\"}\n  \n}\n",
    )
    .await
    .unwrap();

    let cooldown = Cooldown::new();
    let engine = RepairEngine::new(FileStore::new(&path), cooldown.clone(), config());
    let outcome = engine.repair(None).await.unwrap();

    assert_eq!(outcome.edits, 1);
    assert_eq!(
        tokio::fs::read_to_string(&path).await.unwrap(),
        r#"{"name":"widget","version":"1.0.0"}"#
    );
    // The watch loop sees the stamp through its own handle.
    assert!(cooldown.is_cooling(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_missing_file_exhausts_retries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gone.json");

    let engine = RepairEngine::new(FileStore::new(&path), Cooldown::new(), config());
    let err = engine.repair(None).await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
    assert!(!path.exists());
}
