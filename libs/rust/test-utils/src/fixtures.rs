//! Vault response bodies.
//!
//! Shapes follow what a Vault dev server returns, trimmed to the fields gvs
//! reads plus a few it ignores.

use serde_json::{Value, json};

/// Successful AppRole login response carrying `token`.
#[must_use]
pub fn login_response(token: &str) -> Value {
    json!({
        "request_id": "f9ac6b5a-3a83-2d4b-8f2f-4cdb1e1b1d52",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": null,
        "wrap_info": null,
        "warnings": null,
        "auth": {
            "client_token": token,
            "accessor": "0e9e354a-520f-df04-6867-ee81cae3d42d",
            "policies": ["default", "my-app"],
            "token_policies": ["default", "my-app"],
            "metadata": {"role_name": "my-role"},
            "lease_duration": 1200,
            "renewable": true,
            "entity_id": "a4b2c4e4-5f6d-7e8f-9a0b-1c2d3e4f5a6b"
        }
    })
}

/// Mount entry with `options.version` set to `version`, or no options at all
/// when `version` is `None`.
#[must_use]
pub fn kv_mount(version: Option<Value>) -> Value {
    let options = version.map_or(Value::Null, |v| json!({ "version": v }));
    json!({
        "accessor": "kv_8bf51dd1",
        "config": {
            "default_lease_ttl": 0,
            "force_no_cache": false,
            "max_lease_ttl": 0,
            "plugin_name": ""
        },
        "description": "key/value secret storage",
        "local": false,
        "options": options,
        "seal_wrap": false,
        "type": "kv"
    })
}

/// `sys/internal/ui/mounts` response with the given `(name, entry)` secret
/// mounts. Names should carry their trailing `/`.
#[must_use]
pub fn mounts_response(mounts: &[(&str, Value)]) -> Value {
    let secret: serde_json::Map<String, Value> = mounts
        .iter()
        .map(|(name, entry)| ((*name).to_string(), entry.clone()))
        .collect();
    json!({
        "request_id": "2db2f477-9f5e-6d95-c749-fa13f6faa98e",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "auth": {},
            "secret": secret
        },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Mount table of a dev server with `kvV1/`, `kvV2/`, an option-less
/// `legacy/` and the built-in `cubbyhole/`.
#[must_use]
pub fn default_mounts() -> Value {
    mounts_response(&[
        (
            "cubbyhole/",
            json!({"options": null, "type": "cubbyhole", "description": "per-token private secret storage"}),
        ),
        ("kvV1/", kv_mount(Some(json!("1")))),
        ("kvV2/", kv_mount(Some(json!("2")))),
        ("legacy/", kv_mount(None)),
    ])
}

/// KV v1 read response.
#[must_use]
pub fn kv_v1_secret(data: &[(&str, &str)]) -> Value {
    json!({
        "request_id": "5d3a8f1e-0a5b-4d3c-9e2f-7b6a5c4d3e2f",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 2_764_800,
        "data": pairs(data),
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// KV v2 read response at metadata version `version`.
#[must_use]
pub fn kv_v2_secret(data: &[(&str, &str)], version: u32) -> Value {
    json!({
        "request_id": "1a2b3c4d-5e6f-7a8b-9c0d-1e2f3a4b5c6d",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": pairs(data),
            "metadata": {
                "created_time": "2018-03-22T02:24:06.945319214Z",
                "deletion_time": "",
                "destroyed": false,
                "version": version
            }
        },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Vault error body.
#[must_use]
pub fn error_response(message: &str) -> Value {
    json!({ "errors": [message] })
}

fn pairs(data: &[(&str, &str)]) -> Value {
    Value::Object(
        data.iter()
            .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
            .collect(),
    )
}
