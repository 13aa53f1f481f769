//! Credential error types.

use thiserror::Error;

/// Errors that can occur while obtaining or renewing a credential.
///
/// The type is `Clone` so one renewal outcome can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The identity provider rejected the grant; no usable credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network or provider failure, not retried internally.
    #[error("Transient I/O error: {0}")]
    Transient(String),

    /// The provider answered with a body that is not a token response.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl CredentialError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Check if this error requires a fresh password login.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Check if this error is transient and may be retried by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for CredentialError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}
