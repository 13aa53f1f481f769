//! Catalog error types.

use blob_store::StorageError;
use thiserror::Error;

use crate::credentials::CredentialError;

/// Errors returned by [`BackupCatalog`](super::BackupCatalog) operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No metadata object matches an otherwise valid backup identity.
    #[error("Backup {backup_guid} is gone from space {tenant}")]
    Gone { tenant: String, backup_guid: String },

    /// The tenant authorizer refused access.
    #[error("Access to space {tenant} is forbidden: {reason}")]
    Forbidden { tenant: String, reason: String },

    /// The backup is still being produced and cannot be removed.
    #[error("Backup {backup_guid} is still in progress")]
    InProgress { backup_guid: String },

    /// A stored metadata object does not decode as a backup record.
    #[error("Invalid backup record at {key}: {reason}")]
    InvalidRecord { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl CatalogError {
    pub fn gone(tenant: impl Into<String>, backup_guid: impl Into<String>) -> Self {
        Self::Gone {
            tenant: tenant.into(),
            backup_guid: backup_guid.into(),
        }
    }

    pub fn forbidden(tenant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Forbidden {
            tenant: tenant.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the backup no longer exists.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }

    /// Check if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(StorageError::Io(_)) => true,
            Self::Credential(e) => e.is_transient(),
            _ => false,
        }
    }
}
