//! Configuration module.
//!
//! Every setting can come from a command-line flag or an environment variable;
//! `main` loads `.env` through `dotenvy` before parsing.

use std::path::PathBuf;
use std::time::Duration;

use blob_store::StoreConfig;
use clap::{Args, ValueEnum};
use url::Url;

use crate::{Error, Result};

/// Suffix appended to the container prefix to name the archive container.
const BLUEPRINT_SUFFIX: &str = "blueprint";

/// Identity provider (UAA) account used by the broker.
#[derive(Clone, Args)]
pub struct UaaConfig {
    /// UAA base URL.
    #[arg(long = "uaa-url", env = "UAA_URL")]
    pub url: String,

    /// OAuth2 client id used for the password and refresh grants.
    #[arg(long = "uaa-client-id", env = "UAA_CLIENT_ID", default_value = "cf")]
    pub client_id: String,

    #[arg(
        long = "uaa-client-secret",
        env = "UAA_CLIENT_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub client_secret: String,

    /// Service account username.
    #[arg(long = "cf-username", env = "CF_USERNAME")]
    pub username: String,

    #[arg(long = "cf-password", env = "CF_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl UaaConfig {
    pub fn validate(&self) -> Result<()> {
        validate_url("UAA url", &self.url)?;
        if self.username.trim().is_empty() {
            return Err(Error::config("CF username must not be empty"));
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::config("UAA client id must not be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for UaaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaaConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cloud Controller API used for tenant authorization.
#[derive(Debug, Clone, Args)]
pub struct CloudControllerConfig {
    #[arg(long = "cf-api-url", env = "CF_API_URL")]
    pub api_url: String,
}

impl CloudControllerConfig {
    pub fn validate(&self) -> Result<()> {
        validate_url("Cloud Controller url", &self.api_url)
    }
}

/// Backup metadata and archive containers.
#[derive(Debug, Clone, Args)]
pub struct BackupStoreConfig {
    /// Directory holding one sub-directory per container.
    #[arg(long = "backup-store-root", env = "BACKUP_STORE_ROOT")]
    pub root: PathBuf,

    /// Container holding backup metadata objects.
    #[arg(long = "backup-container", env = "BACKUP_CONTAINER")]
    pub container: String,

    /// Prefix of the archive container (`{prefix}-blueprint`).
    #[arg(long = "backup-container-prefix", env = "BACKUP_CONTAINER_PREFIX")]
    pub container_prefix: String,
}

impl BackupStoreConfig {
    pub fn metadata_container(&self) -> &str {
        &self.container
    }

    pub fn blueprint_container(&self) -> String {
        format!("{}-{}", self.container_prefix, BLUEPRINT_SUFFIX)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::Filesystem {
            root: self.root.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("backup store root must not be empty"));
        }
        for (name, value) in [
            ("backup container", self.container.as_str()),
            ("backup container prefix", self.container_prefix.as_str()),
        ] {
            if value.trim().is_empty() || value.contains('/') {
                return Err(Error::config(format!("invalid {}: {:?}", name, value)));
            }
        }
        if self.blueprint_container() == self.container {
            return Err(Error::config(
                "metadata and blueprint containers must be distinct",
            ));
        }
        Ok(())
    }
}

/// Outbound HTTP settings shared by the UAA and Cloud Controller clients.
#[derive(Debug, Clone, Args)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[arg(long = "http-timeout-secs", env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::config("HTTP timeout must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct LogConfig {
    /// Filter directive; `RUST_LOG` wins when set.
    #[arg(long = "log-filter", env = "LOG_FILTER")]
    pub filter: Option<String>,

    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub format: LogFormat,
}

/// Complete application configuration.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    #[command(flatten)]
    pub uaa: UaaConfig,

    #[command(flatten)]
    pub cloud_controller: CloudControllerConfig,

    #[command(flatten)]
    pub backup_store: BackupStoreConfig,

    #[command(flatten)]
    pub http: HttpConfig,

    #[command(flatten)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.uaa.validate()?;
        self.cloud_controller.validate()?;
        self.backup_store.validate()?;
        self.http.validate()
    }
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::config(format!("invalid {}: {}", name, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(format!(
            "invalid {}: unsupported scheme {}",
            name, other
        ))),
    }
}
