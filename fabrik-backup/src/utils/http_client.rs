use std::sync::OnceLock;

use reqwest::Client;
use tracing::debug;

use crate::config::HttpConfig;
use crate::{Error, Result};

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the `reqwest::Client` shared by the UAA and Cloud Controller clients.
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    install_rustls_provider();

    Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = HttpConfig { timeout_secs: 5 };
        assert!(build_http_client(&config).is_ok());
        // Installing twice is harmless.
        install_rustls_provider();
    }
}
