//! Backup metadata record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a backup.
///
/// States this type does not know are kept verbatim in [`BackupState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackupState {
    Processing,
    Succeeded,
    Failed,
    Aborting,
    Aborted,
    Other(String),
}

impl BackupState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborting => "aborting",
            Self::Aborted => "aborted",
            Self::Other(state) => state,
        }
    }

    /// Whether the backup is still being produced.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl From<String> for BackupState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "aborting" => Self::Aborting,
            "aborted" => Self::Aborted,
            _ => Self::Other(state),
        }
    }
}

impl From<BackupState> for String {
    fn from(state: BackupState) -> Self {
        match state {
            BackupState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

/// Metadata object stored per backup.
///
/// Fields this type does not model are kept in `extra` and written back
/// unchanged, so a listed or fetched record echoes the stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub backup_guid: String,
    pub instance_guid: String,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_guid: Option<String>,
    pub state: BackupState,
    /// Timestamps are echoed exactly as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Potentially large; omitted from list results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackupRecord {
    pub fn new(
        backup_guid: impl Into<String>,
        instance_guid: impl Into<String>,
        service_id: impl Into<String>,
        state: BackupState,
    ) -> Self {
        Self {
            backup_guid: backup_guid.into(),
            instance_guid: instance_guid.into(),
            service_id: service_id.into(),
            space_guid: None,
            state,
            started_at: None,
            finished_at: None,
            logs: None,
            extra: Map::new(),
        }
    }

    /// Copy of the record without its `logs`.
    pub fn without_logs(&self) -> Self {
        Self {
            logs: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_minimal_stored_object() {
        let stored = json!({
            "backup_guid": "071acb05-66a3-471b-af3c-8bbf1e4180be",
            "instance_guid": "ab0ed6d6-42d9-4318-9b65-721f34719499",
            "service_id": "24731fb8-7b84-4f57-914f-c3d55d793dd4",
            "state": "succeeded",
            "logs": []
        });

        let record: BackupRecord = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(record.state, BackupState::Succeeded);
        assert_eq!(record.logs, Some(vec![]));
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);

        let mut listed = stored;
        listed.as_object_mut().unwrap().remove("logs");
        assert_eq!(serde_json::to_value(record.without_logs()).unwrap(), listed);
    }

    #[test]
    fn test_preserves_unknown_fields() {
        let stored = json!({
            "backup_guid": "b",
            "instance_guid": "i",
            "service_id": "s",
            "space_guid": "t",
            "state": "processing",
            "type": "online",
            "trigger": "scheduled",
            "secret": {"nested": true}
        });

        let record: BackupRecord = serde_json::from_value(stored.clone()).unwrap();
        assert!(record.state.is_in_progress());
        assert_eq!(record.extra.get("type"), Some(&json!("online")));
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);
    }

    #[test]
    fn test_keeps_unknown_state_verbatim() {
        let stored = json!({
            "backup_guid": "b",
            "instance_guid": "i",
            "service_id": "s",
            "state": "exploded"
        });

        let record: BackupRecord = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(record.state, BackupState::Other("exploded".to_string()));
        assert!(!record.state.is_in_progress());
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);
    }

    #[test]
    fn test_timestamps_round_trip_unchanged() {
        let stored = json!({
            "backup_guid": "b",
            "instance_guid": "i",
            "service_id": "s",
            "state": "succeeded",
            "started_at": "2015-11-18T11:28:42.000Z",
            "finished_at": "2015-11-18T11:31:07.120Z"
        });

        let record: BackupRecord = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(record.started_at.as_deref(), Some("2015-11-18T11:28:42.000Z"));
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);
    }
}
