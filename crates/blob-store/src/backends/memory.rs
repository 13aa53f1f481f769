//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::traits::{ObjectStore, validate_container, validate_key};

/// In-memory object store.
///
/// Listings come back in lexicographic key order.
#[derive(Default)]
pub struct MemoryStore {
    containers: RwLock<BTreeMap<String, BTreeMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of objects across all containers.
    pub fn len(&self) -> usize {
        self.containers.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` currently exists in `container`.
    pub fn contains(&self, container: &str, key: &str) -> bool {
        self.containers
            .read()
            .get(container)
            .is_some_and(|objects| objects.contains_key(key))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>> {
        validate_container(container)?;
        let containers = self.containers.read();
        Ok(containers
            .get(container)
            .map(|objects| {
                objects
                    .range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_object(&self, container: &str, key: &str) -> StorageResult<Bytes> {
        validate_container(container)?;
        self.containers
            .read()
            .get(container)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StorageError::not_found(container, key))
    }

    async fn put_object(&self, container: &str, key: &str, data: Bytes) -> StorageResult<()> {
        validate_container(container)?;
        validate_key(key)?;
        self.containers
            .write()
            .entry(container.to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        validate_container(container)?;
        self.containers
            .write()
            .get_mut(container)
            .and_then(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(container, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_listing_is_ordered_and_scoped() {
        let store = MemoryStore::new();
        for key in ["t1/backup/b.json", "t1/backup/a.json", "t2/backup/c.json"] {
            store
                .put_object("meta", key, Bytes::from_static(b"{}"))
                .await
                .unwrap();
        }

        let keys = store.list_keys("meta", "t1/backup/").await.unwrap();
        assert_eq!(keys, vec!["t1/backup/a.json", "t1/backup/b.json"]);
        assert!(store.list_keys("other", "t1/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_len() {
        let store = MemoryStore::new();
        store
            .put_object("meta", "k", Bytes::from_static(b"v"))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("meta", "k"));

        store.delete_object("meta", "k").await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete_object("meta", "k").await.unwrap_err().is_not_found());
    }
}
