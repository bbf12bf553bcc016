//! AppRole credentials and the session token they are exchanged for.

use crate::error::{VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::path::Path;

/// AppRole role id and secret id.
///
/// Loaded once at startup and used for a single login call.
#[derive(Debug, Clone)]
pub struct AppRoleCredentials {
    role_id: String,
    secret_id: SecretString,
}

/// Login request body.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    role_id: &'a str,
    secret_id: &'a str,
}

impl AppRoleCredentials {
    /// Build credentials from in-memory values.
    #[must_use]
    pub fn new(role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            secret_id: SecretString::from(secret_id.into()),
        }
    }

    /// Read both identifiers from mounted credential files.
    ///
    /// Surrounding whitespace (a trailing newline in particular) is trimmed.
    ///
    /// # Errors
    ///
    /// `Credentials` when a file cannot be read, `EmptyCredential` when a
    /// file holds nothing but whitespace.
    pub async fn from_files(role_id_path: &Path, secret_id_path: &Path) -> VaultResult<Self> {
        let role_id = read_credential(role_id_path).await?;
        let secret_id = read_credential(secret_id_path).await?;
        Ok(Self {
            role_id,
            secret_id: SecretString::from(secret_id),
        })
    }

    /// Role id.
    #[must_use]
    pub fn role_id(&self) -> &str {
        &self.role_id
    }

    pub(crate) fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            role_id: &self.role_id,
            secret_id: self.secret_id.expose_secret(),
        }
    }
}

async fn read_credential(path: &Path) -> VaultResult<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| VaultError::Credentials {
            path: path.to_path_buf(),
            source,
        })?;

    let value = raw.trim();
    if value.is_empty() {
        return Err(VaultError::EmptyCredential(path.to_path_buf()));
    }
    Ok(value.to_string())
}

/// Short-lived Vault token, owned by the current run.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token value, for the `X-Vault-Token` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}
