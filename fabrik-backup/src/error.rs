//! Application-wide error types.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::credentials::CredentialError;

/// Application-wide result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] blob_store::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Credential(e) => e.is_transient(),
            Self::Catalog(e) => e.is_transient(),
            Self::Storage(blob_store::StorageError::Io(_)) => true,
            _ => false,
        }
    }
}
