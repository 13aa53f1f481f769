//! Storage trait definitions.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{StorageError, StorageResult};

/// Object store addressed by `(container, key)`.
///
/// Keys use `/` as the path separator. Transport, retry and timeout policy
/// belong to the implementation; callers treat every method as one remote call.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List every key in `container` that starts with `prefix`.
    ///
    /// A missing container or an empty prefix match yields an empty list.
    async fn list_keys(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>>;

    /// Fetch the full object body.
    ///
    /// Returns [`StorageError::NotFound`] when the key does not exist.
    async fn get_object(&self, container: &str, key: &str) -> StorageResult<Bytes>;

    /// Create or replace an object.
    async fn put_object(&self, container: &str, key: &str, data: Bytes) -> StorageResult<()>;

    /// Remove an object.
    ///
    /// Returns [`StorageError::NotFound`] when the key does not exist.
    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()>;
}

/// Reject container names that cannot be mapped to a single path segment.
pub(crate) fn validate_container(container: &str) -> StorageResult<()> {
    if container.is_empty()
        || container == "."
        || container == ".."
        || container.contains('/')
        || container.contains('\\')
    {
        return Err(StorageError::InvalidContainer(container.to_string()));
    }
    Ok(())
}

/// Reject keys that would escape their container.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.starts_with('\\') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "contains unsafe path component: {key}"
        )));
    }
    Ok(())
}
