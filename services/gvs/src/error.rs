//! Service error type.

use gvs_vault_client::{ErrorKind, VaultError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Step of the secret directory probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// Creating the probe file
    Create,
    /// Writing to it
    Write,
    /// Syncing it to storage
    Sync,
    /// Deleting it
    Delete,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Sync => "sync",
            Self::Delete => "delete",
        })
    }
}

/// Errors raised while seeding secrets.
#[derive(Error, Debug)]
pub enum GvsError {
    /// Vault call failed
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Secret file could not be created or written
    #[error("Cannot write secret file {}", path.display())]
    FileWrite {
        /// Target file
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML rendering failed
    #[error("Cannot render secrets as YAML")]
    Serialization(#[from] serde_yaml_ng::Error),

    /// Secret directory is not writable or files in it cannot be deleted
    #[error("Secret directory unusable: {step} of probe file {} failed", path.display())]
    Probe {
        /// Failed step
        step: ProbeStep,
        /// Probe file
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// Deletion of the secret file could not be scheduled
    #[error("Cannot schedule deletion of {}", path.display())]
    Schedule {
        /// Secret file
        path: PathBuf,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GvsError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Vault(e) => e.kind(),
            Self::FileWrite { .. } | Self::Serialization(_) => ErrorKind::FileWrite,
            Self::Probe { .. } => ErrorKind::Probe,
            Self::Schedule { .. } => ErrorKind::Schedule,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_vault_errors_keep_their_kind() {
        let err: GvsError = VaultError::secret_fetch("kv/app", "status 404").into();
        assert_eq!(err.kind(), ErrorKind::SecretFetch);
        assert_eq!(err.to_string(), "Failed to read secret at kv/app: status 404");
    }

    #[test]
    fn test_probe_display() {
        let err = GvsError::Probe {
            step: ProbeStep::Create,
            path: PathBuf::from("/missing/gvs.tmp"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "Secret directory unusable: create of probe file /missing/gvs.tmp failed"
        );
        assert_eq!(err.kind(), ErrorKind::Probe);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_file_write_kind() {
        let err = GvsError::FileWrite {
            path: PathBuf::from("/dev/shm/gvs"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::FileWrite);
        assert_eq!(GvsError::config("x").kind(), ErrorKind::Config);
    }
}
