//! Secret paths, the flat secret mapping, and the Vault KV wire formats.

use crate::error::{VaultError, VaultResult};
use crate::mounts::KvVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Normalized secret store path: no leading or trailing `/`, no empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretPath(String);

impl SecretPath {
    /// Normalize a raw path.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when nothing but separators remain.
    pub fn parse(raw: &str) -> VaultResult<Self> {
        let normalized = raw
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if normalized.is_empty() {
            return Err(VaultError::InvalidConfig(format!("empty secret path: {raw:?}")));
        }
        Ok(Self(normalized))
    }

    /// Path of a named secret below this one (`<self>/<name>`).
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `name` is empty.
    pub fn join(&self, name: &str) -> VaultResult<Self> {
        let child = Self::parse(name)?;
        Ok(Self(format!("{}/{}", self.0, child.0)))
    }

    /// First segment, the mount name.
    #[must_use]
    pub fn mount(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// KV v2 read path: `data` inserted after the mount unless already there.
    #[must_use]
    pub fn kv2_data_path(&self) -> Self {
        let mut segments = self.0.split('/');
        let mount = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();
        match rest.first() {
            Some(&"data") => self.clone(),
            _ if rest.is_empty() => Self(format!("{mount}/data")),
            _ => Self(format!("{mount}/data/{}", rest.join("/"))),
        }
    }

    /// Path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat secret key to value mapping.
///
/// Ordered internally so output files are deterministic. `Debug` lists keys
/// only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretMapping(BTreeMap<String, String>);

impl SecretMapping {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Debug for SecretMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `auth/approle/login` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub auth: Option<AuthData>,
}

/// The `auth` block of a login response.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthData {
    #[serde(default)]
    pub client_token: String,
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
}

/// KV v1 read: `data` is the flat map.
#[derive(Debug, Deserialize)]
pub(crate) struct KvV1Response {
    pub data: HashMap<String, serde_json::Value>,
}

/// KV v2 read: the flat map sits one level deeper.
#[derive(Debug, Deserialize)]
pub(crate) struct KvV2Response {
    pub data: KvV2Data,
}

/// The outer `data` block of a KV v2 read. `data` is null for a deleted
/// or destroyed version.
#[derive(Debug, Deserialize)]
pub(crate) struct KvV2Data {
    pub data: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub metadata: Option<KvMetadata>,
}

/// KV v2 version metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KvMetadata {
    /// Creation time of this version
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_time: Option<DateTime<Utc>>,
    /// Soft-deletion time, empty when not deleted
    #[serde(default)]
    pub deletion_time: String,
    /// Whether the version was destroyed
    #[serde(default)]
    pub destroyed: bool,
    /// Version number
    #[serde(default)]
    pub version: u32,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

/// A parsed secret read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSecret {
    /// Flat key/value data
    pub mapping: SecretMapping,
    /// Version metadata (KV v2 only)
    pub metadata: Option<KvMetadata>,
}

/// Parse a secret read body in the shape given by `version`.
///
/// # Errors
///
/// `SecretFetch` carrying `path` when the body does not match the shape.
pub fn parse_secret(path: &SecretPath, version: KvVersion, body: &[u8]) -> VaultResult<ParsedSecret> {
    let fail = |e: &dyn fmt::Display| VaultError::secret_fetch(path.as_str(), format!("malformed KV {version} body: {e}"));

    match version {
        KvVersion::V1 => {
            let response: KvV1Response = serde_json::from_slice(body).map_err(|e| fail(&e))?;
            Ok(ParsedSecret {
                mapping: flatten(response.data),
                metadata: None,
            })
        }
        KvVersion::V2 => {
            let response: KvV2Response = serde_json::from_slice(body).map_err(|e| fail(&e))?;
            let data = response
                .data
                .data
                .ok_or_else(|| fail(&"no data (version deleted or destroyed)"))?;
            Ok(ParsedSecret {
                mapping: flatten(data),
                metadata: response.data.metadata,
            })
        }
    }
}

/// Strings stay verbatim, `null` is dropped, anything else becomes its JSON text.
fn flatten(data: HashMap<String, serde_json::Value>) -> SecretMapping {
    data.into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}
