//! Container-scoped object storage for the backup catalog.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait (list / get / put / delete by container and key)
//! - Backends: local filesystem and in-memory

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemStore, memory::MemoryStore};
pub use error::{StorageError, StorageResult};
pub use traits::ObjectStore;

use std::path::PathBuf;
use std::sync::Arc;

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// One directory per container below `root`.
    Filesystem { root: PathBuf },
    /// Process-local, lost on exit.
    Memory,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Filesystem { root } if root.as_os_str().is_empty() => {
                Err("filesystem store root must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Create an object store from configuration.
pub async fn from_config(config: &StoreConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StoreConfig::Filesystem { root } => {
            let backend = FilesystemStore::new(root).await?;
            Ok(Arc::new(backend))
        }
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
