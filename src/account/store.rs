//! Local persistence for the signed-in user.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AccountError;

/// Where the signed-in user is remembered between runs.
///
/// Stores raw JSON so a corrupt entry can be detected and discarded by the
/// caller.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, AccountError>;

    async fn save(&self, json: &str) -> Result<(), AccountError>;

    async fn clear(&self) -> Result<(), AccountError>;
}

/// A single JSON file on local disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn load(&self) -> Result<Option<String>, AccountError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, json: &str) -> Result<(), AccountError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AccountError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the entry in memory only.
#[derive(Default)]
pub struct MemoryStore {
    value: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(json: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(json.into())),
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn load(&self) -> Result<Option<String>, AccountError> {
        Ok(self.value.read().await.clone())
    }

    async fn save(&self, json: &str) -> Result<(), AccountError> {
        *self.value.write().await = Some(json.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AccountError> {
        *self.value.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/user.json"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save(r#"{"id":"abc"}"#).await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some(r#"{"id":"abc"}"#));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.save("x").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("x"));
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
