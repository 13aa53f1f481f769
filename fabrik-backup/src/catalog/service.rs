//! Backup catalog service.

use std::sync::Arc;

use blob_store::ObjectStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::authorizer::TenantAuthorizer;
use super::error::CatalogError;
use super::key::{BackupKey, archive_prefix, tenant_prefix};
use super::platform::Platform;
use super::record::{BackupRecord, BackupState};

/// List, get and delete tenant backups across the metadata and blueprint containers.
///
/// Holds no state of its own; the containers are the only source of truth.
pub struct BackupCatalog {
    store: Arc<dyn ObjectStore>,
    authorizer: Arc<dyn TenantAuthorizer>,
    metadata_container: String,
    blueprint_container: String,
}

impl BackupCatalog {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        authorizer: Arc<dyn TenantAuthorizer>,
        metadata_container: impl Into<String>,
        blueprint_container: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authorizer,
            metadata_container: metadata_container.into(),
            blueprint_container: blueprint_container.into(),
        }
    }

    pub fn metadata_container(&self) -> &str {
        &self.metadata_container
    }

    pub fn blueprint_container(&self) -> &str {
        &self.blueprint_container
    }

    /// Every backup of `tenant`, without logs, in storage listing order.
    ///
    /// Metadata objects that do not decode as a record are skipped and logged.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &str,
        platform: Option<&str>,
    ) -> Result<Vec<BackupRecord>, CatalogError> {
        self.authorize(tenant, platform).await?;

        let keys = self.metadata_keys(tenant).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.read_record(key).await {
                Ok(record) => records.push(record.without_logs()),
                Err(CatalogError::InvalidRecord { key, reason }) => {
                    warn!(key = %key, reason = %reason, "Skipping undecodable backup record");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(count = records.len(), "Listed backups");
        Ok(records)
    }

    /// One backup including its logs.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        tenant: &str,
        backup_guid: &str,
        platform: Option<&str>,
    ) -> Result<BackupRecord, CatalogError> {
        self.authorize(tenant, platform).await?;

        let key = self.locate(tenant, backup_guid).await?;
        self.read_record(&key).await
    }

    /// Remove a backup's metadata object, then every archive object under its guid.
    ///
    /// Only a stored `processing` state blocks the removal; metadata that
    /// does not decode as a record is still removed.
    ///
    /// The two removals are not atomic. A failure after the metadata object is
    /// gone is returned as an error and the metadata removal stays applied.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        tenant: &str,
        backup_guid: &str,
        platform: Option<&str>,
    ) -> Result<(), CatalogError> {
        self.authorize(tenant, platform).await?;

        let key = self.locate(tenant, backup_guid).await?;
        let metadata_key = key.encode();
        let body = self
            .store
            .get_object(&self.metadata_container, &metadata_key)
            .await?;
        if stored_state(&body).is_some_and(|state| state.is_in_progress()) {
            return Err(CatalogError::InProgress {
                backup_guid: backup_guid.to_string(),
            });
        }

        self.store
            .delete_object(&self.metadata_container, &metadata_key)
            .await?;
        debug!(key = %metadata_key, "Removed backup metadata");

        let prefix = archive_prefix(backup_guid);
        let archives = self
            .store
            .list_keys(&self.blueprint_container, &prefix)
            .await?;
        for archive in &archives {
            self.store
                .delete_object(&self.blueprint_container, archive)
                .await?;
            debug!(key = %archive, "Removed backup archive");
        }

        info!(archives = archives.len(), "Deleted backup");
        Ok(())
    }

    /// Write `record` as the metadata object of `tenant` started at `started_at`.
    ///
    /// Seeds the catalog; it does not authorize the tenant.
    #[instrument(skip(self, record), fields(backup_guid = %record.backup_guid))]
    pub async fn put(
        &self,
        tenant: &str,
        record: &BackupRecord,
        started_at: DateTime<Utc>,
    ) -> Result<BackupKey, CatalogError> {
        let key = BackupKey::new(
            tenant,
            &record.service_id,
            &record.instance_guid,
            &record.backup_guid,
            started_at,
        )
        .map_err(|e| CatalogError::InvalidRecord {
            key: record.backup_guid.clone(),
            reason: e.to_string(),
        })?;

        let body = serde_json::to_vec(record).map_err(|e| CatalogError::InvalidRecord {
            key: key.encode(),
            reason: e.to_string(),
        })?;
        self.store
            .put_object(&self.metadata_container, &key.encode(), Bytes::from(body))
            .await?;

        debug!(key = %key, "Stored backup metadata");
        Ok(key)
    }

    async fn authorize(&self, tenant: &str, platform: Option<&str>) -> Result<(), CatalogError> {
        let platform = Platform::resolve(platform);
        self.authorizer.authorize(tenant, platform).await
    }

    /// Decoded metadata keys under the tenant prefix. Undecodable keys are skipped.
    async fn metadata_keys(&self, tenant: &str) -> Result<Vec<BackupKey>, CatalogError> {
        let prefix = tenant_prefix(tenant);
        let keys = self
            .store
            .list_keys(&self.metadata_container, &prefix)
            .await?;

        Ok(keys
            .iter()
            .filter_map(|key| match BackupKey::decode(key) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping malformed backup key");
                    None
                }
            })
            .collect())
    }

    async fn locate(&self, tenant: &str, backup_guid: &str) -> Result<BackupKey, CatalogError> {
        let mut matches = self
            .metadata_keys(tenant)
            .await?
            .into_iter()
            .filter(|key| key.backup_guid() == backup_guid);

        let key = matches
            .next()
            .ok_or_else(|| CatalogError::gone(tenant, backup_guid))?;
        if matches.next().is_some() {
            warn!(key = %key, "Several metadata objects share this backup guid, using the first");
        }
        Ok(key)
    }

    async fn read_record(&self, key: &BackupKey) -> Result<BackupRecord, CatalogError> {
        let encoded = key.encode();
        let body = self
            .store
            .get_object(&self.metadata_container, &encoded)
            .await?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::InvalidRecord {
            key: encoded,
            reason: e.to_string(),
        })
    }
}

/// State of a stored metadata object, read without requiring a full record.
fn stored_state(body: &[u8]) -> Option<BackupState> {
    #[derive(Deserialize)]
    struct StoredState {
        state: Option<BackupState>,
    }

    serde_json::from_slice::<StoredState>(body)
        .ok()
        .and_then(|stored| stored.state)
}
