//! Tenant authorization.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CloudControllerConfig;
use crate::credentials::{CredentialError, TokenIssuer};
use crate::{Error, Result};

use super::error::CatalogError;
use super::platform::Platform;

/// Verifies that the broker may act on a tenant's backups.
#[async_trait]
pub trait TenantAuthorizer: Send + Sync + 'static {
    async fn authorize(&self, tenant: &str, platform: Platform) -> Result<(), CatalogError>;
}

/// Authorizer that looks the space up on the Cloud Controller with the
/// broker's own bearer token.
///
/// This only proves that the broker account can see the space; it does not
/// check the role of whoever asked for the operation. A broker account with
/// admin scope sees every space, so every existing tenant is authorized.
/// Callers that need per-user checks must verify the user's space role
/// themselves before reaching the catalog.
pub struct CloudControllerAuthorizer {
    client: Client,
    api_url: Url,
    issuer: TokenIssuer,
}

impl CloudControllerAuthorizer {
    pub fn new(client: Client, config: &CloudControllerConfig, issuer: TokenIssuer) -> Result<Self> {
        let mut api_url = Url::parse(&config.api_url).map_err(|e| {
            Error::config(format!("invalid Cloud Controller url {}: {}", config.api_url, e))
        })?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self {
            client,
            api_url,
            issuer,
        })
    }

    fn space_url(&self, tenant: &str) -> Result<Url, CatalogError> {
        self.api_url
            .join(&format!("v2/spaces/{}", tenant))
            .map_err(|e| CatalogError::forbidden(tenant, format!("invalid space guid: {}", e)))
    }
}

#[async_trait]
impl TenantAuthorizer for CloudControllerAuthorizer {
    #[instrument(skip(self))]
    async fn authorize(&self, tenant: &str, platform: Platform) -> Result<(), CatalogError> {
        if platform != Platform::CloudFoundry {
            return Err(CatalogError::forbidden(
                tenant,
                format!("platform {} is not served by the Cloud Controller", platform),
            ));
        }
        if tenant.is_empty() || tenant.contains(['/', '?', '#']) {
            return Err(CatalogError::forbidden(tenant, "invalid space guid"));
        }

        let url = self.space_url(tenant)?;
        let token = self.issuer.get_access_token().await?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("bearer {}", token))
            .send()
            .await
            .map_err(CredentialError::from)?;

        match response.status() {
            s if s.is_success() => {
                debug!("Space access confirmed");
                Ok(())
            }
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(CatalogError::forbidden(
                tenant,
                format!("Cloud Controller responded with {}", response.status()),
            )),
            StatusCode::UNAUTHORIZED => Err(CredentialError::unauthorized(
                "Cloud Controller rejected the broker token",
            )
            .into()),
            status => Err(CredentialError::transient(format!(
                "Cloud Controller responded with {}",
                status
            ))
            .into()),
        }
    }
}
