//! Identity provider seam.

use async_trait::async_trait;

use super::error::CredentialError;
use super::types::TokenPayload;

/// Grants consumed by the credential lifecycle.
///
/// Implementations own their transport, timeouts and retry policy.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Primary authentication with the service account's username and password.
    async fn access_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPayload, CredentialError>;

    /// Exchange a refresh token for a new token pair.
    async fn access_with_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPayload, CredentialError>;
}
