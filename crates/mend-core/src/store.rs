//! Document storage abstraction.
//!
//! The repair engine never touches the filesystem directly; it goes through a
//! [`DocumentStore`] so tests can observe reads and inject failures.

use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Trait for reading and writing the watched document (allows mocking in tests)
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full current content.
    async fn read(&self) -> Result<String>;

    /// Replace the full content.
    async fn write(&self, text: &str) -> Result<()>;

    /// Path of the underlying document, for diagnostics.
    fn path(&self) -> &Path;
}

/// Store backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> Result<String> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        debug!("Read {} bytes", text.len());
        Ok(text)
    }

    #[instrument(skip(self, text), fields(path = %self.path.display()))]
    async fn write(&self, text: &str) -> Result<()> {
        tokio::fs::write(&self.path, text).await?;
        debug!("Wrote {} bytes", text.len());
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.read().await.unwrap(), "{}");

        store.write(r#"{"a":1}"#).await.unwrap();
        assert_eq!(store.read().await.unwrap(), r#"{"a":1}"#);
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("missing.json"));
        assert!(matches!(store.read().await, Err(crate::Error::Io(_))));
    }
}
