//! Vault client configuration.

use crate::error::{VaultError, VaultResult};
use std::time::Duration;

/// Default timeout for every call made to Vault.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, without trailing slash
    pub addr: String,
    /// Request timeout
    pub timeout: Duration,
    /// Skip TLS certificate verification
    pub insecure_tls: bool,
}

impl VaultConfig {
    /// Create a new configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the address is empty or is not an
    /// `http`/`https` URL.
    pub fn new(addr: impl Into<String>) -> VaultResult<Self> {
        let addr = addr.into().trim().trim_end_matches('/').to_string();
        if addr.is_empty() {
            return Err(VaultError::InvalidConfig("Vault address is empty".to_string()));
        }
        if !(addr.starts_with("http://") || addr.starts_with("https://")) {
            return Err(VaultError::InvalidConfig(format!(
                "Vault address must start with http:// or https://, got {addr}"
            )));
        }

        Ok(Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
            insecure_tls: false,
        })
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept self-signed certificates.
    #[must_use]
    pub const fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    /// Full URL of an API path, e.g. `auth/approle/login`.
    #[must_use]
    pub fn url(&self, api_path: &str) -> String {
        format!("{}/v1/{}", self.addr, api_path.trim_start_matches('/'))
    }
}
