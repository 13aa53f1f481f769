//! Storage key naming for backup metadata and archives.
//!
//! Metadata objects live at
//! `{tenant}/backup/{service_id}.{instance_guid}.{backup_guid}.{started_at}.json`
//! in the metadata container. Archives live under `{backup_guid}/` in the
//! blueprint container.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use thiserror::Error;

/// Path segment between the tenant and the metadata file name.
const BACKUP_SEGMENT: &str = "backup";
const METADATA_EXTENSION: &str = ".json";
/// `started_at` format; colons are replaced so the timestamp stays one key segment.
const STARTED_AT_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";
const ARCHIVE_FILE: &str = "volume.tgz.enc";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Malformed backup key {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Invalid {field} {value:?}: must be non-empty without '.' or '/'")]
    InvalidSegment { field: &'static str, value: String },
}

impl KeyError {
    fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Structured identity of one backup metadata object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupKey {
    tenant: String,
    service_id: String,
    instance_guid: String,
    backup_guid: String,
    started_at: DateTime<Utc>,
}

impl BackupKey {
    /// Build a key, truncating `started_at` to whole seconds.
    pub fn new(
        tenant: impl Into<String>,
        service_id: impl Into<String>,
        instance_guid: impl Into<String>,
        backup_guid: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, KeyError> {
        let key = Self {
            tenant: tenant.into(),
            service_id: service_id.into(),
            instance_guid: instance_guid.into(),
            backup_guid: backup_guid.into(),
            started_at: started_at.trunc_subsecs(0),
        };
        check_segment("tenant", &key.tenant)?;
        check_segment("service_id", &key.service_id)?;
        check_segment("instance_guid", &key.instance_guid)?;
        check_segment("backup_guid", &key.backup_guid)?;
        Ok(key)
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn instance_guid(&self) -> &str {
        &self.instance_guid
    }

    pub fn backup_guid(&self) -> &str {
        &self.backup_guid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}.{}.{}.{}{}",
            tenant_prefix(&self.tenant),
            self.service_id,
            self.instance_guid,
            self.backup_guid,
            format_started_at(self.started_at),
            METADATA_EXTENSION
        )
    }

    pub fn decode(key: &str) -> Result<Self, KeyError> {
        let (path, filename) = key
            .rsplit_once('/')
            .ok_or_else(|| KeyError::malformed(key, "missing path separator"))?;

        let tenant = match path.split_once('/') {
            Some((tenant, BACKUP_SEGMENT)) => tenant,
            _ => {
                return Err(KeyError::malformed(
                    key,
                    format!("expected {{tenant}}/{}/ prefix", BACKUP_SEGMENT),
                ));
            }
        };

        let stem = filename
            .strip_suffix(METADATA_EXTENSION)
            .ok_or_else(|| KeyError::malformed(key, "missing .json extension"))?;

        let segments: Vec<&str> = stem.split('.').collect();
        let [service_id, instance_guid, backup_guid, started_at] = segments[..] else {
            return Err(KeyError::malformed(
                key,
                format!("expected 4 file name segments, found {}", segments.len()),
            ));
        };

        let started_at = parse_started_at(started_at)
            .ok_or_else(|| KeyError::malformed(key, format!("invalid timestamp {started_at}")))?;

        Self::new(tenant, service_id, instance_guid, backup_guid, started_at)
            .map_err(|e| KeyError::malformed(key, e.to_string()))
    }
}

impl std::fmt::Display for BackupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Listing prefix of every metadata object owned by `tenant`.
pub fn tenant_prefix(tenant: &str) -> String {
    format!("{}/{}/", tenant, BACKUP_SEGMENT)
}

/// Listing prefix of every archive object of one backup.
pub fn archive_prefix(backup_guid: &str) -> String {
    format!("{}/", backup_guid)
}

/// Key of the primary encrypted archive of one backup.
pub fn archive_key(backup_guid: &str) -> String {
    format!("{}{}", archive_prefix(backup_guid), ARCHIVE_FILE)
}

pub fn format_started_at(started_at: DateTime<Utc>) -> String {
    started_at.format(STARTED_AT_FORMAT).to_string()
}

pub fn parse_started_at(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, STARTED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn check_segment(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() || value.contains('.') || value.contains('/') {
        return Err(KeyError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
