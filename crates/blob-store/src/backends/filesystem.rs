//! Local filesystem storage backend.
//!
//! Each container is a directory directly below the root, and each key is a
//! relative path inside it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::traits::{ObjectStore, validate_container, validate_key};

/// Suffix marker for in-progress writes; never reported by listings.
const TEMP_MARKER: &str = ".tmp.";

/// Local filesystem object store.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store rooted at `root`, creating it if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_path(&self, container: &str) -> StorageResult<PathBuf> {
        validate_container(container)?;
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.container_path(container)?.join(key))
    }

    fn map_not_found(container: &str, key: &str, err: std::io::Error) -> StorageError {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::not_found(container, key)
        } else {
            StorageError::Io(err)
        }
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list_keys(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let container_root = self.container_path(container)?;

        // Walk from the deepest directory the prefix names, then filter on the full prefix.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let base_path = if dir_part.is_empty() {
            container_root.clone()
        } else {
            validate_key(dir_part)?;
            container_root.join(dir_part)
        };

        let mut results = Vec::new();
        match fs::try_exists(&base_path).await {
            Ok(false) => return Ok(results),
            Ok(true) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(results),
            Err(e) => return Err(StorageError::Io(e)),
        }

        let mut stack = vec![base_path];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                // Symlinks are ignored so listings never leave the container.
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file()
                    && let Ok(rel) = path.strip_prefix(&container_root)
                {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    if key.starts_with(prefix) && !key.contains(TEMP_MARKER) {
                        results.push(key);
                    }
                }
            }
        }

        results.sort();
        Ok(results)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_object(&self, container: &str, key: &str) -> StorageResult<Bytes> {
        let path = self.object_path(container, key)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| Self::map_not_found(container, key, e))?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put_object(&self, container: &str, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a uniquely named sibling, fsync, then rename into place.
        let temp_name = format!("{TEMP_MARKER}{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(container, key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::map_not_found(container, key, e))
    }
}
