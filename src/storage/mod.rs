//! Object storage for downloaded payloads
//!
//! Each saved identifier becomes one object keyed by the identifier itself.
//! Keys are used verbatim as a single path segment, so `x~y` lands in a file
//! named `x~y`. Identifiers that cannot name a single file (empty, `.`, `..`,
//! containing `/` or control characters) are rejected with
//! [`StorageError::InvalidKey`]. Production runs write into a local
//! directory; tests use the in-memory backend.

use object_store::{ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path as StoragePath};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata returned after upload
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Storage client wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    pub root: String,
}

impl StorageClient {
    /// Storage rooted at an existing local directory
    pub fn local(dir: &Path) -> Result<Self> {
        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self {
            store: Arc::new(store),
            root: dir.display().to_string(),
        })
    }

    /// Create in-memory storage for testing
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            root: "memory".to_string(),
        }
    }

    /// Upload bytes to storage
    pub async fn upload(&self, key: &str, data: Vec<u8>) -> Result<UploadMetadata> {
        let path = storage_key(key)?;
        let size = data.len();

        let put_result = self.store.put(&path, data.into()).await?;

        tracing::debug!(key, size, "Stored object");

        Ok(UploadMetadata {
            key: key.to_string(),
            etag: put_result.e_tag,
            size,
        })
    }

    /// Serialize a payload as JSON and upload it
    pub async fn upload_json<P: Serialize>(&self, key: &str, payload: &P) -> Result<UploadMetadata> {
        let data = serde_json::to_vec(payload)?;
        self.upload(key, data).await
    }

    /// Download from storage
    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = storage_key(key)?;

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = storage_key(key)?;

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map an identifier onto exactly one object path segment without
/// percent-encoding it.
fn storage_key(key: &str) -> Result<StoragePath> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.chars().any(char::is_control);
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    StoragePath::parse(key).map_err(|_| StorageError::InvalidKey(key.to_string()))
}
