//! Service container for dependency injection.
//!
//! The ServiceContainer is the single place where the token issuer, the
//! object store and the catalog are constructed and handed to each other.

use std::sync::Arc;

use blob_store::ObjectStore;
use tracing::{debug, info};

use crate::Result;
use crate::catalog::{BackupCatalog, CloudControllerAuthorizer, TenantAuthorizer};
use crate::config::AppConfig;
use crate::credentials::{IdentityProvider, TokenIssuer, UaaClient};
use crate::utils::http_client::build_http_client;

/// Service container holding all application services.
pub struct ServiceContainer {
    /// Credential lifecycle of the broker account.
    pub issuer: TokenIssuer,
    /// Object store backing both containers.
    pub store: Arc<dyn ObjectStore>,
    /// Backup catalog.
    pub catalog: Arc<BackupCatalog>,
}

impl ServiceContainer {
    /// Build every service from validated configuration.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        info!("Initializing service container");
        config.validate()?;

        let client = build_http_client(&config.http)?;

        let provider: Arc<dyn IdentityProvider> =
            Arc::new(UaaClient::new(client.clone(), &config.uaa)?);
        let issuer = TokenIssuer::from_config(provider, &config.uaa);

        let store = blob_store::from_config(&config.backup_store.store_config()).await?;

        let authorizer: Arc<dyn TenantAuthorizer> = Arc::new(CloudControllerAuthorizer::new(
            client,
            &config.cloud_controller,
            issuer.clone(),
        )?);

        Ok(Self::with_services(
            issuer,
            store,
            authorizer,
            config.backup_store.metadata_container(),
            &config.backup_store.blueprint_container(),
        ))
    }

    /// Assemble a container from already constructed collaborators.
    pub fn with_services(
        issuer: TokenIssuer,
        store: Arc<dyn ObjectStore>,
        authorizer: Arc<dyn TenantAuthorizer>,
        metadata_container: &str,
        blueprint_container: &str,
    ) -> Self {
        let catalog = Arc::new(BackupCatalog::new(
            store.clone(),
            authorizer,
            metadata_container,
            blueprint_container,
        ));

        debug!(
            metadata_container,
            blueprint_container, "Service container initialized"
        );

        Self {
            issuer,
            store,
            catalog,
        }
    }

    /// Cancel the pending credential renewal and forget the credential.
    pub fn shutdown(&self) {
        info!("Shutting down services");
        self.issuer.logout();
    }
}
