//! Credential management module.
//!
//! Keeps the broker's own account authorized against the identity provider.
//!
//! # Architecture
//!
//! - [`Credential`]: Current access/refresh token pair with absolute expiries
//! - [`IdentityProvider`]: Password and refresh-token grants
//! - [`UaaClient`]: `reqwest` implementation of the grants
//! - [`TokenIssuer`]: Owns the credential and its background renewal

mod error;
mod issuer;
mod provider;
mod types;
mod uaa;

pub use error::CredentialError;
pub use issuer::{MAX_RENEWAL_DELAY_SECS, TokenIssuer, renewal_delay};
pub use provider::IdentityProvider;
pub use types::{Credential, EXPIRY_GRACE_SECS, TokenPayload};
pub use uaa::UaaClient;
