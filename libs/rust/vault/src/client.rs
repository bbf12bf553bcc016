//! Vault HTTP client: AppRole login, mount listing and KV reads.

use crate::{
    config::VaultConfig,
    credentials::{AppRoleCredentials, SessionToken},
    error::{VaultError, VaultResult},
    mounts::{KvVersion, MountTable},
    provider::SecretStore,
    secrets::{AuthResponse, ParsedSecret, SecretMapping, SecretPath, parse_secret},
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rust_common::{HttpConfig, build_http_client};
use tracing::{debug, info, instrument, warn};

const LOGIN_PATH: &str = "auth/approle/login";
const MOUNTS_PATH: &str = "sys/internal/ui/mounts";
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Vault client. Holds no token; callers pass the session token to each call.
#[derive(Debug, Clone)]
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let mut http_config = HttpConfig::default().with_timeout(config.timeout);
        if config.insecure_tls {
            http_config = http_config.with_insecure_tls();
        }
        let http = build_http_client(&http_config)
            .map_err(|e| VaultError::InvalidConfig(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Authenticate with the AppRole method.
    ///
    /// # Errors
    ///
    /// `Transport` on connection failure, `AuthRejected` on a non-2xx status
    /// or an empty token, `Protocol` when the body is not a login response.
    #[instrument(skip_all, fields(role_id = %credentials.role_id()))]
    pub async fn login(&self, credentials: &AppRoleCredentials) -> VaultResult<SessionToken> {
        let response = self
            .http
            .post(self.config.url(LOGIN_PATH))
            .json(&credentials.login_request())
            .send()
            .await
            .map_err(|e| VaultError::transport(LOGIN_PATH, e))?;

        let status = response.status();
        let body = read_body(LOGIN_PATH, response).await?;

        if !status.is_success() {
            return Err(VaultError::AuthRejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let auth_response: AuthResponse =
            serde_json::from_slice(&body).map_err(|e| VaultError::protocol("login", e))?;

        let auth = auth_response
            .auth
            .filter(|auth| !auth.client_token.is_empty())
            .ok_or_else(|| VaultError::AuthRejected {
                status: status.as_u16(),
                body: "response carried no client token".to_string(),
            })?;

        info!(
            lease_secs = auth.lease_duration,
            renewable = auth.renewable,
            policies = ?auth.policies.unwrap_or_default(),
            "Authenticated with Vault"
        );
        Ok(SessionToken::new(auth.client_token))
    }

    /// List the secret mounts visible to `token`.
    ///
    /// # Errors
    ///
    /// `Transport`, `UnexpectedStatus` on a non-2xx status, `Protocol` on a
    /// malformed table.
    #[instrument(skip_all)]
    pub async fn mounts(&self, token: &SessionToken) -> VaultResult<MountTable> {
        let response = self
            .http
            .get(self.config.url(MOUNTS_PATH))
            .header(TOKEN_HEADER, token.expose())
            .send()
            .await
            .map_err(|e| VaultError::transport(MOUNTS_PATH, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::UnexpectedStatus {
                endpoint: MOUNTS_PATH.to_string(),
                status: status.as_u16(),
            });
        }

        let body = read_body(MOUNTS_PATH, response).await?;
        let table = MountTable::from_response(&body)?;
        debug!(count = table.mounts().len(), "Listed secret mounts");
        Ok(table)
    }

    /// KV version of the mount at `prefix`.
    ///
    /// Falls back to `V1` when no mount matches; that case is logged since it
    /// usually means a typo in the path or a token without list rights.
    ///
    /// # Errors
    ///
    /// Same as [`Self::mounts`].
    #[instrument(skip(self, token))]
    pub async fn detect_kv_version(&self, token: &SessionToken, prefix: &str) -> VaultResult<KvVersion> {
        let table = self.mounts(token).await?;
        if let Some(version) = table.kv_version(prefix) {
            debug!(%version, "Resolved KV version");
            Ok(version)
        } else {
            warn!(prefix, "No mount matches prefix, assuming KV v1");
            Ok(KvVersion::V1)
        }
    }

    /// Read one secret, keeping KV v2 metadata.
    ///
    /// # Errors
    ///
    /// `Transport` on connection failure, `SecretFetch` on a non-2xx status or
    /// a body that does not match `version`.
    #[instrument(skip(self, token, path), fields(path = %path))]
    pub async fn fetch_secret(
        &self,
        token: &SessionToken,
        path: &SecretPath,
        version: KvVersion,
    ) -> VaultResult<ParsedSecret> {
        let response = self
            .http
            .get(self.config.url(path.as_str()))
            .header(TOKEN_HEADER, token.expose())
            .send()
            .await
            .map_err(|e| VaultError::transport(path.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::secret_fetch(path.as_str(), status_reason(status)));
        }

        let body = read_body(path.as_str(), response).await?;
        let parsed = parse_secret(path, version, &body)?;

        if let Some(metadata) = &parsed.metadata {
            debug!(
                secret_version = metadata.version,
                created = ?metadata.created_time,
                "Read KV v2 secret"
            );
        }
        debug!(keys = parsed.mapping.len(), "Read secret");
        Ok(parsed)
    }
}

async fn read_body(endpoint: &str, response: Response) -> VaultResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| VaultError::transport(endpoint, e))
}

fn status_reason(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "status 404: no secret at this path".to_string(),
        StatusCode::FORBIDDEN => "status 403: permission denied".to_string(),
        other => format!("status {}", other.as_u16()),
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    type Error = VaultError;

    async fn login(&self, credentials: &AppRoleCredentials) -> VaultResult<SessionToken> {
        Self::login(self, credentials).await
    }

    async fn kv_version(&self, token: &SessionToken, prefix: &str) -> VaultResult<KvVersion> {
        self.detect_kv_version(token, prefix).await
    }

    async fn read_secret(
        &self,
        token: &SessionToken,
        path: &SecretPath,
        version: KvVersion,
    ) -> VaultResult<SecretMapping> {
        self.fetch_secret(token, path, version)
            .await
            .map(|parsed| parsed.mapping)
    }
}
