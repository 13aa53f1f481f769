//! UAA (OAuth2) identity provider client.
//!
//! Both grants go to `POST {uaa}/oauth/token` with HTTP basic client
//! authentication and a form-encoded body.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::UaaConfig;
use crate::{Error, Result};

use super::error::CredentialError;
use super::provider::IdentityProvider;
use super::types::TokenPayload;

const TOKEN_PATH: &str = "oauth/token";

/// OAuth2 error body (`{"error": "...", "error_description": "..."}`).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// UAA client implementing the password and refresh-token grants.
pub struct UaaClient {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl UaaClient {
    pub fn new(client: Client, config: &UaaConfig) -> Result<Self> {
        let mut base = Url::parse(&config.url)
            .map_err(|e| Error::config(format!("invalid UAA url {}: {}", config.url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let token_url = base
            .join(TOKEN_PATH)
            .map_err(|e| Error::config(format!("invalid UAA url {}: {}", config.url, e)))?;

        Ok(Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Token endpoint this client posts to.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenPayload, CredentialError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        match status {
            s if s.is_success() => serde_json::from_slice::<TokenPayload>(&body)
                .map_err(|e| CredentialError::InvalidResponse(e.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let reason = serde_json::from_slice::<OAuthErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.error_description.or(b.error))
                    .unwrap_or_else(|| status.to_string());
                Err(CredentialError::Unauthorized(reason))
            }
            _ => Err(CredentialError::Transient(format!(
                "identity provider responded with {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvider for UaaClient {
    #[instrument(skip(self, password), fields(token_url = %self.token_url))]
    async fn access_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPayload, CredentialError> {
        debug!("Requesting token with password grant");
        self.request_token(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    #[instrument(skip_all, fields(token_url = %self.token_url))]
    async fn access_with_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPayload, CredentialError> {
        debug!("Requesting token with refresh_token grant");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}
