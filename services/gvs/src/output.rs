//! Secret file rendering and writing.

use crate::error::GvsError;
use gvs_vault_client::SecretMapping;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Secret file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One YAML mapping document
    Yaml,
    /// `KEY=VALUE` lines, keys upper-cased, values verbatim
    #[default]
    Env,
}

impl FromStr for OutputFormat {
    type Err = GvsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" | "structured" => Ok(Self::Yaml),
            "env" | "line" | "" => Ok(Self::Env),
            other => Err(GvsError::config(format!("Invalid output format: {other}"))),
        }
    }
}

impl OutputFormat {
    /// Name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Env => "env",
        }
    }
}

/// Upper-case every key.
///
/// Keys that collide once upper-cased keep the value of the one that sorts
/// last (`db` wins over `DB`), and the collision is logged.
#[must_use]
pub fn fold_keys(mapping: &SecretMapping) -> SecretMapping {
    let mut folded = SecretMapping::new();
    for (key, value) in mapping.iter() {
        let upper = key.to_uppercase();
        if folded.get(&upper).is_some() {
            warn!(key = %upper, "Secret keys collide once upper-cased, keeping the last");
        }
        folded.insert(upper, value);
    }
    folded
}

/// Render the mapping in `format`.
///
/// The env format writes the keys of [`fold_keys`], one line each. Values are
/// not quoted, so a value containing a newline produces a file the consumer
/// cannot parse back.
///
/// # Errors
///
/// `Serialization` if YAML rendering fails.
pub fn render(mapping: &SecretMapping, format: OutputFormat) -> Result<String, GvsError> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml_ng::to_string(mapping)?),
        OutputFormat::Env => {
            let mut out = String::new();
            for (key, value) in fold_keys(mapping).iter() {
                let _ = writeln!(out, "{key}={value}");
            }
            Ok(out)
        }
    }
}

/// Create or truncate `path`, write the rendered mapping and sync it.
///
/// On unix the file is created with mode `0600`.
///
/// # Errors
///
/// `FileWrite` on any I/O failure, `Serialization` if rendering fails.
pub async fn write_secret_file(
    mapping: &SecretMapping,
    path: &Path,
    format: OutputFormat,
) -> Result<(), GvsError> {
    let rendered = render(mapping, format)?;
    let file_err = |source| GvsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await.map_err(file_err)?;
    file.write_all(rendered.as_bytes()).await.map_err(file_err)?;
    file.flush().await.map_err(file_err)?;
    file.sync_all().await.map_err(file_err)?;

    debug!(path = %path.display(), format = format.as_str(), keys = mapping.len(), "Secret file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn mapping(pairs: &[(&str, &str)]) -> SecretMapping {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("Structured".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("line".parse::<OutputFormat>().unwrap(), OutputFormat::Env);
        assert_eq!("".parse::<OutputFormat>().unwrap(), OutputFormat::Env);
        assert!("toml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_env_single_line() {
        let out = render(&mapping(&[("K", "V")]), OutputFormat::Env).unwrap();
        assert_eq!(out, "K=V\n");
    }

    #[test]
    fn test_env_keys_upper_cased_values_verbatim() {
        let out = render(
            &mapping(&[("db_password", "p=a ss"), ("api-key", "Abc")]),
            OutputFormat::Env,
        )
        .unwrap();
        assert_eq!(out, "API-KEY=Abc\nDB_PASSWORD=p=a ss\n");
    }

    #[test]
    fn test_env_keys_colliding_once_upper_cased() {
        let out = render(
            &mapping(&[("DB", "upper"), ("db", "lower"), ("port", "5432")]),
            OutputFormat::Env,
        )
        .unwrap();
        assert_eq!(out, "DB=lower\nPORT=5432\n");
    }

    #[test]
    fn test_fold_keys() {
        let folded = fold_keys(&mapping(&[("gvs_appname", "evil"), ("Db", "x")]));
        assert_eq!(folded.keys().collect::<Vec<_>>(), ["DB", "GVS_APPNAME"]);
        assert_eq!(folded.get("GVS_APPNAME"), Some("evil"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let source = mapping(&[("secret1", "value1"), ("port", "5432"), ("flag", "true")]);
        let out = render(&source, OutputFormat::Yaml).unwrap();
        let back: BTreeMap<String, String> = serde_yaml_ng::from_str(&out).unwrap();
        assert_eq!(back.get("secret1").map(String::as_str), Some("value1"));
        assert_eq!(back.get("port").map(String::as_str), Some("5432"));
        assert_eq!(back.get("flag").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvs");
        std::fs::write(&path, "OLD=content that is longer\n").unwrap();

        write_secret_file(&mapping(&[("K", "V")]), &path, OutputFormat::Env)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "K=V\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_mode_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvs");
        write_secret_file(&mapping(&[("K", "V")]), &path, OutputFormat::Env)
            .await
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_write_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("gvs");
        let err = write_secret_file(&mapping(&[("K", "V")]), &path, OutputFormat::Env)
            .await
            .unwrap_err();
        assert!(matches!(err, GvsError::FileWrite { .. }));
    }
}
