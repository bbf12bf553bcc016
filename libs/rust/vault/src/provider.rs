//! Secret store abstraction used by the seeding pipeline.

use crate::credentials::{AppRoleCredentials, SessionToken};
use crate::mounts::KvVersion;
use crate::secrets::{SecretMapping, SecretPath};
use async_trait::async_trait;

/// The three calls one seeding run makes, in order.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Exchange AppRole credentials for a session token.
    async fn login(&self, credentials: &AppRoleCredentials) -> Result<SessionToken, Self::Error>;

    /// KV version of the mount at `prefix`; `V1` when no mount matches.
    async fn kv_version(&self, token: &SessionToken, prefix: &str) -> Result<KvVersion, Self::Error>;

    /// Read one secret and flatten it.
    async fn read_secret(
        &self,
        token: &SessionToken,
        path: &SecretPath,
        version: KvVersion,
    ) -> Result<SecretMapping, Self::Error>;

    /// Read several secrets in order and merge them, later reads winning.
    async fn read_secrets(
        &self,
        token: &SessionToken,
        paths: &[SecretPath],
        version: KvVersion,
    ) -> Result<SecretMapping, Self::Error> {
        let mut merged = SecretMapping::new();
        for path in paths {
            merged.merge(self.read_secret(token, path, version).await?);
        }
        Ok(merged)
    }
}
