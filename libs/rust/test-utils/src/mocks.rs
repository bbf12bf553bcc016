//! Wiremock-backed Vault stub.
//!
//! Each `mock_*` method mounts one endpoint on the underlying server. Tokens
//! are matched on the `X-Vault-Token` header, so a read with the wrong token
//! gets wiremock's default 404.

use crate::fixtures;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A stub Vault server.
pub struct VaultStub {
    server: MockServer,
}

impl VaultStub {
    /// Start a stub with nothing mounted.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL, to be used as the Vault address.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Underlying server, for custom mocks and request inspection.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Accept `role_id` and answer with `token`.
    pub async fn mock_login(&self, role_id: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_partial_json(json!({ "role_id": role_id })))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::login_response(token)))
            .mount(&self.server)
            .await;
    }

    /// Answer a login for `role_id` with `status` and a Vault error body.
    pub async fn mock_login_status(&self, role_id: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_partial_json(json!({ "role_id": role_id })))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(fixtures::error_response("invalid role or secret ID")),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer a login for `role_id` with 200 and `raw` as body.
    pub async fn mock_login_raw(&self, role_id: &str, raw: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_partial_json(json!({ "role_id": role_id })))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` as the mount table for `token`.
    pub async fn mock_mounts(&self, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/sys/internal/ui/mounts"))
            .and(header("X-Vault-Token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a raw string as the mount table for `token`.
    pub async fn mock_mounts_raw(&self, token: &str, raw: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/sys/internal/ui/mounts"))
            .and(header("X-Vault-Token", token))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` at `/v1/<secret_path>` for `token`.
    pub async fn mock_secret(&self, token: &str, secret_path: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}", secret_path.trim_start_matches('/'))))
            .and(header("X-Vault-Token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer reads of `/v1/<secret_path>` with `status`.
    pub async fn mock_secret_status(&self, secret_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}", secret_path.trim_start_matches('/'))))
            .respond_with(ResponseTemplate::new(status).set_body_json(fixtures::error_response("permission denied")))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
