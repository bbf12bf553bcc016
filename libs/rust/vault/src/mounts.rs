//! Secret engine mounts and KV version selection.
//!
//! `sys/internal/ui/mounts` returns the secret mounts as an object keyed by
//! mount name (`"kv_v2/"`), and the name is not repeated inside the value.
//! The table is therefore parsed in two steps: the outer envelope first, then
//! the inner object, re-attaching each key as the descriptor's prefix.

use crate::error::{VaultError, VaultResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// KV engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KvVersion {
    /// KV v1: `data` is the flat map. Also the fallback when unsure.
    #[default]
    V1,
    /// KV v2: `data.data` is the flat map, plus version metadata.
    V2,
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

/// `options.version` as sent by the server: a string on most releases, a
/// number on some.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VersionOption {
    /// `"2"`
    Text(String),
    /// `2`
    Number(i64),
}

impl VersionOption {
    fn kv_version(&self) -> KvVersion {
        match self {
            Self::Text(s) if s.trim() == "2" => KvVersion::V2,
            Self::Number(2) => KvVersion::V2,
            _ => KvVersion::V1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MountOptions {
    #[serde(default)]
    version: Option<VersionOption>,
}

#[derive(Debug, Deserialize)]
struct RawMount {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    options: Option<MountOptions>,
}

#[derive(Debug, Deserialize)]
struct MountListResponse {
    data: MountListData,
}

#[derive(Debug, Deserialize)]
struct MountListData {
    #[serde(default)]
    secret: serde_json::Value,
}

/// Engine type of a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountType {
    /// Key/value engine
    Kv,
    /// Anything else (`cubbyhole`, `identity`, `system`, ...)
    Other(String),
}

impl From<String> for MountType {
    fn from(kind: String) -> Self {
        if kind == "kv" { Self::Kv } else { Self::Other(kind) }
    }
}

/// One secret mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountDescriptor {
    /// Mount name with trailing `/`, e.g. `kv_v2/`
    pub path_prefix: String,
    /// Engine type
    pub kind: MountType,
    /// KV version; `V1` unless `options.version` says 2
    pub kv_version: KvVersion,
}

impl MountDescriptor {
    fn from_raw(path_prefix: String, raw: RawMount) -> Self {
        let kv_version = raw
            .options
            .and_then(|o| o.version)
            .map_or(KvVersion::V1, |v| v.kv_version());
        Self {
            path_prefix,
            kind: MountType::from(raw.kind),
            kv_version,
        }
    }
}

/// All secret mounts visible to the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    mounts: Vec<MountDescriptor>,
}

impl MountTable {
    /// Parse a `sys/internal/ui/mounts` response body.
    ///
    /// # Errors
    ///
    /// `Protocol` when either the envelope or the inner mount object is
    /// malformed.
    pub fn from_response(body: &[u8]) -> VaultResult<Self> {
        let response: MountListResponse =
            serde_json::from_slice(body).map_err(|e| VaultError::protocol("mount list", e))?;

        let secret = match response.data.secret {
            serde_json::Value::Null => return Ok(Self::default()),
            other => other,
        };
        let raw: HashMap<String, RawMount> =
            serde_json::from_value(secret).map_err(|e| VaultError::protocol("mount table", e))?;

        let mut mounts: Vec<MountDescriptor> = raw
            .into_iter()
            .map(|(name, mount)| MountDescriptor::from_raw(name, mount))
            .collect();
        mounts.sort_by(|a, b| a.path_prefix.cmp(&b.path_prefix));
        Ok(Self { mounts })
    }

    /// Descriptor for a prefix, with or without its trailing `/`.
    #[must_use]
    pub fn find(&self, prefix: &str) -> Option<&MountDescriptor> {
        let wanted = normalize_prefix(prefix);
        self.mounts.iter().find(|m| m.path_prefix == wanted)
    }

    /// KV version for a prefix; `None` when no mount matches.
    #[must_use]
    pub fn kv_version(&self, prefix: &str) -> Option<KvVersion> {
        self.find(prefix).map(|m| m.kv_version)
    }

    /// All descriptors, ordered by prefix.
    #[must_use]
    pub fn mounts(&self) -> &[MountDescriptor] {
        &self.mounts
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    format!("{trimmed}/")
}
