//! HashiCorp Vault client for gvs.
//!
//! Covers exactly what a one-shot secret seeding run needs: AppRole login,
//! KV version detection from the mount table, and KV v1/v2 reads flattened
//! into a [`SecretMapping`]. No token renewal, no caching, no retries.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mounts;
pub mod provider;
pub mod secrets;

pub use client::VaultClient;
pub use config::VaultConfig;
pub use credentials::{AppRoleCredentials, SessionToken};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use mounts::{KvVersion, MountDescriptor, MountTable, MountType};
pub use provider::SecretStore;
pub use secrets::{KvMetadata, ParsedSecret, SecretMapping, SecretPath};
