//! Vault error types using thiserror 2.0.
//!
//! Every variant keeps the call it came from (endpoint, secret path or file)
//! and, where there is one, the underlying error as its `source`, so the
//! binary can print the full chain. Nothing in this crate retries.

use std::path::PathBuf;
use thiserror::Error;

/// Broad error category, stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network or connection failure
    Transport,
    /// Credentials refused by the login endpoint
    AuthRejected,
    /// Malformed or unexpected response
    Protocol,
    /// Secret read failed
    SecretFetch,
    /// Credential files unreadable or empty
    Credentials,
    /// Local configuration invalid
    Config,
    /// Secret file could not be written
    FileWrite,
    /// Secret directory failed the write/delete probe
    Probe,
    /// Secret file deletion could not be scheduled
    Schedule,
}

impl ErrorKind {
    /// Short, stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::AuthRejected => "auth_rejected",
            Self::Protocol => "protocol",
            Self::SecretFetch => "secret_fetch",
            Self::Credentials => "credentials",
            Self::Config => "config",
            Self::FileWrite => "file_write",
            Self::Probe => "probe",
            Self::Schedule => "schedule",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Request never produced a response
    #[error("Vault unreachable at {endpoint}")]
    Transport {
        /// Endpoint being called
        endpoint: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Login refused
    #[error("AppRole login rejected (status {status}): {body}")]
    AuthRejected {
        /// HTTP status code, 200 when the body carried no token
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Malformed {what} response")]
    Protocol {
        /// Which document was being parsed
        what: &'static str,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Non-success status on a call that has no dedicated variant
    #[error("Unexpected status {status} from {endpoint}")]
    UnexpectedStatus {
        /// Endpoint being called
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// Secret read failed
    #[error("Failed to read secret at {path}: {reason}")]
    SecretFetch {
        /// Secret path
        path: String,
        /// Status or parse failure description
        reason: String,
    },

    /// Credential file unreadable
    #[error("Cannot read credential file {}", path.display())]
    Credentials {
        /// File path
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// Credential file present but empty
    #[error("Credential file {} is empty", .0.display())]
    EmptyCredential(PathBuf),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::AuthRejected { .. } => ErrorKind::AuthRejected,
            Self::Protocol { .. } | Self::UnexpectedStatus { .. } => ErrorKind::Protocol,
            Self::SecretFetch { .. } => ErrorKind::SecretFetch,
            Self::Credentials { .. } | Self::EmptyCredential(_) => ErrorKind::Credentials,
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create a protocol error.
    #[must_use]
    pub const fn protocol(what: &'static str, source: serde_json::Error) -> Self {
        Self::Protocol { what, source }
    }

    /// Create a secret fetch error.
    #[must_use]
    pub fn secret_fetch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SecretFetch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
