//! Centralized configuration for gvs.
//!
//! All configuration is loaded from `GVS_*` environment variables (and an
//! optional `.env` file) and validated once at startup. The resulting
//! [`Config`] is immutable and passed by reference to every step.

use crate::destruct::DEFAULT_MAX_EXPOSURE;
use crate::error::GvsError;
use crate::output::OutputFormat;
use gvs_vault_client::{KvVersion, SecretPath, VaultConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the secret file inside the secret directory.
pub const SECRET_FILE_NAME: &str = "gvs";

const DEFAULT_SECRET_DIR: &str = "/dev/shm";
const DEFAULT_ROLE_ID_PATH: &str = "/run/secrets/role_id";
const DEFAULT_SECRET_ID_PATH: &str = "/run/secrets/secret_id";
const DEFAULT_KV_MOUNT: &str = "secret";

/// Where the secret lives and how its KV version is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTarget {
    /// Base path as configured (normalized)
    pub base: SecretPath,
    /// KV version source
    pub version: VersionSource,
}

/// KV version source for a [`SecretTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// Known from the path shape
    Known(KvVersion),
    /// Ask the mount table for this mount
    Detect {
        /// Mount name, without trailing `/`
        mount: String,
    },
}

/// gvs configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Application identity
    /// Application name, injected as `GVS_APPNAME`
    pub app_name: String,
    /// Application environment, injected as `GVS_APPENV`
    pub app_env: String,

    // Vault settings
    /// Vault client configuration
    pub vault: VaultConfig,
    /// Raw secret path, empty for the default
    pub secret_path: String,
    /// Secret names below the path, fetched in order
    pub secret_list: Vec<String>,
    /// File holding the AppRole role id
    pub role_id_path: PathBuf,
    /// File holding the AppRole secret id
    pub secret_id_path: PathBuf,

    // Secret file settings
    /// Secret file path
    pub secret_file: PathBuf,
    /// Output format
    pub output_format: OutputFormat,
    /// Requested exposure time
    pub available_time: Duration,
    /// Upper bound on the exposure time
    pub max_available_time: Duration,

    // Logging
    /// Log level filter
    pub log_level: String,
    /// JSON log output
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, GvsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GvsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &str| get(name).ok_or_else(|| GvsError::config(format!("{name} is not set")));

        let app_name = required("GVS_APPNAME")?;
        let app_env = required("GVS_APPENV")?;

        let vault = VaultConfig::new(required("GVS_VAULTURL")?)?
            .with_timeout(Duration::from_secs(parse_env(&get, "GVS_VAULTTIMEOUT", 2)?))
            .with_insecure_tls(parse_env(&get, "GVS_VAULTSKIPVERIFY", false)?);

        let secret_path = get("GVS_SECRETPATH").unwrap_or_default();
        let secret_list = get("GVS_SECRETLIST")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let secret_dir = get("GVS_SECRETFILEPATH").map_or_else(|| PathBuf::from(DEFAULT_SECRET_DIR), PathBuf::from);
        let secret_file = secret_dir.join(SECRET_FILE_NAME);

        let output_format = get("GVS_OUTPUTFORMAT")
            .map(|f| f.parse::<OutputFormat>())
            .transpose()?
            .unwrap_or_default();

        let available_time = Duration::from_secs(parse_env(&get, "GVS_SECRETAVAILABLETIME", 60)?);
        let max_available_time = Duration::from_secs(parse_env(
            &get,
            "GVS_MAXAVAILABLETIME",
            DEFAULT_MAX_EXPOSURE.as_secs(),
        )?);

        Ok(Self {
            app_name,
            app_env,
            vault,
            secret_path,
            secret_list,
            role_id_path: get("GVS_VAULTROLEID").map_or_else(|| PathBuf::from(DEFAULT_ROLE_ID_PATH), PathBuf::from),
            secret_id_path: get("GVS_VAULTSECRETID")
                .map_or_else(|| PathBuf::from(DEFAULT_SECRET_ID_PATH), PathBuf::from),
            secret_file,
            output_format,
            available_time,
            max_available_time,
            log_level: get("GVS_LOGLEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_env(&get, "GVS_LOGJSON", false)?,
        })
    }

    /// Resolve the configured secret path.
    ///
    /// - empty: `secret/data/<app>/<env>`, KV v2
    /// - single name: `secret/data/<name>`, KV v2
    /// - anything longer: version detected from the first segment's mount
    ///
    /// # Errors
    ///
    /// `Config` when the resulting path is empty.
    pub fn secret_target(&self) -> Result<SecretTarget, GvsError> {
        let default_v2 = |rest: &str| -> Result<SecretTarget, GvsError> {
            Ok(SecretTarget {
                base: SecretPath::parse(&format!("{DEFAULT_KV_MOUNT}/data/{rest}"))?,
                version: VersionSource::Known(KvVersion::V2),
            })
        };

        if self.secret_path.trim_matches('/').is_empty() {
            return default_v2(&format!("{}/{}", self.app_name, self.app_env));
        }

        let base = SecretPath::parse(&self.secret_path)?;
        if base.depth() == 1 {
            return default_v2(base.as_str());
        }

        Ok(SecretTarget {
            version: VersionSource::Detect {
                mount: base.mount().to_string(),
            },
            base,
        })
    }
}

/// Parse an optional variable, falling back to `default`.
fn parse_env<T, G>(get: &G, name: &str, default: T) -> Result<T, GvsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(val) => val
            .parse()
            .map_err(|e| GvsError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, GvsError> {
        let mut env: HashMap<String, String> = [
            ("GVS_APPNAME", "my-app"),
            ("GVS_APPENV", "dev"),
            ("GVS_VAULTURL", "http://localhost:8200"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in vars {
            env.insert((*k).to_string(), (*v).to_string());
        }
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.secret_file, PathBuf::from("/dev/shm/gvs"));
        assert_eq!(config.available_time, Duration::from_secs(60));
        assert_eq!(config.max_available_time, Duration::from_secs(180));
        assert_eq!(config.output_format, OutputFormat::Env);
        assert_eq!(config.role_id_path, PathBuf::from("/run/secrets/role_id"));
        assert_eq!(config.secret_id_path, PathBuf::from("/run/secrets/secret_id"));
        assert_eq!(config.vault.timeout, Duration::from_secs(2));
        assert!(config.secret_list.is_empty());
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("GVS_SECRETFILEPATH", "/tmp/secrets"),
            ("GVS_SECRETAVAILABLETIME", "30"),
            ("GVS_OUTPUTFORMAT", "yaml"),
            ("GVS_SECRETLIST", "db, api ,,cache"),
            ("GVS_LOGJSON", "true"),
        ])
        .unwrap();
        assert_eq!(config.secret_file, PathBuf::from("/tmp/secrets/gvs"));
        assert_eq!(config.available_time, Duration::from_secs(30));
        assert_eq!(config.output_format, OutputFormat::Yaml);
        assert_eq!(config.secret_list, ["db", "api", "cache"]);
        assert!(config.log_json);
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("GVS_APPNAME"));

        let err = config(&[("GVS_VAULTURL", "  ")]).unwrap_err();
        assert!(err.to_string().contains("GVS_VAULTURL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("GVS_SECRETAVAILABLETIME", "soon")]).is_err());
        assert!(config(&[("GVS_OUTPUTFORMAT", "xml")]).is_err());
        assert!(config(&[("GVS_VAULTURL", "localhost:8200")]).is_err());
    }

    #[test]
    fn test_target_default_path() {
        let target = config(&[]).unwrap().secret_target().unwrap();
        assert_eq!(target.base.as_str(), "secret/data/my-app/dev");
        assert_eq!(target.version, VersionSource::Known(KvVersion::V2));
    }

    #[test]
    fn test_target_single_name() {
        let target = config(&[("GVS_SECRETPATH", "shared")]).unwrap().secret_target().unwrap();
        assert_eq!(target.base.as_str(), "secret/data/shared");
        assert_eq!(target.version, VersionSource::Known(KvVersion::V2));
    }

    #[test]
    fn test_target_full_path_detects() {
        let target = config(&[("GVS_SECRETPATH", "/kv_v2/my-app-dev/")])
            .unwrap()
            .secret_target()
            .unwrap();
        assert_eq!(target.base.as_str(), "kv_v2/my-app-dev");
        assert_eq!(
            target.version,
            VersionSource::Detect {
                mount: "kv_v2".to_string()
            }
        );
    }
}
