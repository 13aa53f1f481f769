//! Core credential types.

use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Lead time before expiry at which a token counts as "expiring soon".
pub const EXPIRY_GRACE_SECS: i64 = 15;

/// Raw token response returned by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub refresh_token: String,
    /// Seconds until the refresh token expires, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenPayload {
    /// Build a payload with explicit lifetimes for both tokens.
    pub fn new(
        access_token: impl Into<String>,
        expires_in: i64,
        refresh_token: impl Into<String>,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
            refresh_token: refresh_token.into(),
            refresh_expires_in: Some(refresh_expires_in),
            token_type: Some("bearer".to_string()),
            scope: None,
        }
    }
}

impl std::fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPayload")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &"<redacted>")
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The current access/refresh token pair and their absolute expiries.
///
/// An empty credential has both expiries at the epoch, so it always reports
/// both tokens as expiring soon.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential {
    access_token: String,
    access_token_expiry: DateTime<Utc>,
    refresh_token: String,
    refresh_token_expiry: DateTime<Utc>,
}

impl Credential {
    /// The unauthenticated credential.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the relative lifetimes of `payload` against `now`.
    pub fn from_payload(payload: &TokenPayload, now: DateTime<Utc>) -> Self {
        let refresh_token_expiry = match payload.refresh_expires_in {
            Some(secs) => offset(now, secs),
            // Missing lifetime and undecodable token: force the login path.
            None => jwt_expiry(&payload.refresh_token).unwrap_or(now),
        };

        Self {
            access_token: payload.access_token.clone(),
            access_token_expiry: offset(now, payload.expires_in),
            refresh_token: payload.refresh_token.clone(),
            refresh_token_expiry,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn access_token_expiry(&self) -> DateTime<Utc> {
        self.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> DateTime<Utc> {
        self.refresh_token_expiry
    }

    /// Whole seconds until the access token expires (negative once expired).
    pub fn access_token_expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.access_token_expiry - now).num_seconds()
    }

    pub fn access_token_expires_soon_at(&self, now: DateTime<Utc>) -> bool {
        expires_soon(self.access_token_expiry, now)
    }

    pub fn refresh_token_expires_soon_at(&self, now: DateTime<Utc>) -> bool {
        expires_soon(self.refresh_token_expiry, now)
    }

    pub fn access_token_expires_soon(&self) -> bool {
        self.access_token_expires_soon_at(Utc::now())
    }

    pub fn refresh_token_expires_soon(&self) -> bool {
        self.refresh_token_expires_soon_at(Utc::now())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token", &"<redacted>")
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

fn expires_soon(expiry: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let threshold = expiry
        .checked_sub_signed(TimeDelta::seconds(EXPIRY_GRACE_SECS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    now >= threshold
}

fn offset(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(if secs > 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}

/// Read the `exp` claim from a JWT without verifying its signature.
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&raw).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}
