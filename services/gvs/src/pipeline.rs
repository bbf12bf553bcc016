//! One seeding run: probe, authenticate, resolve, fetch, write, schedule.

use crate::config::{Config, VersionSource};
use crate::destruct::{self, Reaper, ScheduledDeletion};
use crate::error::GvsError;
use crate::output::{OutputFormat, fold_keys, write_secret_file};
use gvs_vault_client::{AppRoleCredentials, KvVersion, SecretPath, SecretStore};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Key holding the application name in every secret file.
pub const APP_NAME_KEY: &str = "GVS_APPNAME";

/// Key holding the application environment in every secret file.
pub const APP_ENV_KEY: &str = "GVS_APPENV";

/// Last state a run reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing done yet
    Init,
    /// Session token obtained
    Authenticated,
    /// KV version and read paths known
    VersionResolved,
    /// Secrets read and merged
    SecretFetched,
    /// Secret file on disk
    FileWritten,
    /// Deletion arranged
    DeleteScheduled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Authenticated => "authenticated",
            Self::VersionResolved => "version-resolved",
            Self::SecretFetched => "secret-fetched",
            Self::FileWritten => "file-written",
            Self::DeleteScheduled => "delete-scheduled",
        })
    }
}

/// A failed run.
#[derive(Error, Debug)]
#[error("Secret seeding failed (last stage: {stage})")]
pub struct PipelineError {
    /// Last stage reached before the failure
    pub stage: Stage,
    /// Cause
    #[source]
    pub source: GvsError,
}

/// A successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Written file
    pub secret_file: PathBuf,
    /// Keys written, sorted
    pub keys: Vec<String>,
    /// KV version used for the reads
    pub kv_version: KvVersion,
    /// How the file will disappear
    pub deletion: ScheduledDeletion,
}

/// Seeding pipeline over a secret store.
pub struct Pipeline<'a, S> {
    config: &'a Config,
    store: S,
    reaper: Reaper,
}

impl<'a, S> Pipeline<'a, S>
where
    S: SecretStore,
    GvsError: From<S::Error>,
{
    /// Create a pipeline.
    pub const fn new(config: &'a Config, store: S, reaper: Reaper) -> Self {
        Self { config, store, reaper }
    }

    /// Run once.
    ///
    /// # Errors
    ///
    /// `PipelineError` carrying the last stage reached and the cause. When the
    /// failure happens after the file was written, the file is already gone.
    #[instrument(skip(self), fields(app = %self.config.app_name, env = %self.config.app_env))]
    pub async fn run(&self) -> Result<Outcome, PipelineError> {
        let mut stage = Stage::Init;
        let result = self.execute(&mut stage).await;
        result.map_err(|source| {
            error!(%stage, kind = %source.kind(), error = %source, "Secret seeding failed");
            PipelineError { stage, source }
        })
    }

    async fn execute(&self, stage: &mut Stage) -> Result<Outcome, GvsError> {
        let config = self.config;

        destruct::probe(&config.secret_file)?;
        let target = config.secret_target()?;

        let credentials =
            AppRoleCredentials::from_files(&config.role_id_path, &config.secret_id_path).await?;
        let token = self.store.login(&credentials).await?;
        *stage = Stage::Authenticated;

        let (base, kv_version) = match target.version {
            VersionSource::Known(version) => (target.base, version),
            VersionSource::Detect { mount } => {
                let version = self.store.kv_version(&token, &mount).await?;
                let base = match version {
                    KvVersion::V2 => target.base.kv2_data_path(),
                    KvVersion::V1 => target.base,
                };
                (base, version)
            }
        };
        let paths = read_paths(&base, &config.secret_list)?;
        *stage = Stage::VersionResolved;
        debug!(%kv_version, base = %base, count = paths.len(), "Read paths resolved");

        let mut mapping = self.store.read_secrets(&token, &paths, kv_version).await?;
        // Fold before injecting so `gvs_appname` cannot shadow the injected key.
        if config.output_format == OutputFormat::Env {
            mapping = fold_keys(&mapping);
        }
        mapping.insert(APP_NAME_KEY, config.app_name.as_str());
        mapping.insert(APP_ENV_KEY, config.app_env.as_str());
        *stage = Stage::SecretFetched;
        info!(keys = mapping.len(), "Secrets fetched");

        write_secret_file(&mapping, &config.secret_file, config.output_format).await?;
        *stage = Stage::FileWritten;
        info!(path = %config.secret_file.display(), format = config.output_format.as_str(), "Secret file written");

        let deletion = match self.reaper.schedule(&config.secret_file, config.available_time) {
            Ok(deletion) => deletion,
            Err(e) => {
                if let Err(rm) = destruct::remove_now(&config.secret_file) {
                    error!(path = %config.secret_file.display(), error = %rm, "Secret file could not be removed");
                }
                return Err(e);
            }
        };
        *stage = Stage::DeleteScheduled;

        Ok(Outcome {
            secret_file: config.secret_file.clone(),
            keys: mapping.keys().map(String::from).collect(),
            kv_version,
            deletion,
        })
    }
}

/// `base` alone, or `base/<name>` for every listed name in order.
fn read_paths(base: &SecretPath, names: &[String]) -> Result<Vec<SecretPath>, GvsError> {
    if names.is_empty() {
        return Ok(vec![base.clone()]);
    }
    names
        .iter()
        .map(|name| base.join(name).map_err(GvsError::from))
        .collect()
}
