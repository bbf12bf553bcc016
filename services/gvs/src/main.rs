//! gvs entrypoint.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gvs::destruct::{self, Reaper};
use gvs::{Config, Pipeline};
use gvs_vault_client::VaultClient;
use rust_common::{TracingConfig, init_tracing};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gvs", version, about = "Seed secrets from Vault into a self-destructing file")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch secrets and write the secret file (default)
    Run,
    /// Delete a secret file after a delay
    #[command(hide = true)]
    Reap {
        /// Seconds to wait before deleting
        #[arg(long)]
        delay_secs: u64,
        /// File to delete
        path: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run().await,
        Command::Reap { delay_secs, path } => reap(&path, delay_secs).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "gvs failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&TracingConfig::default());
            return Err(e).context("Invalid configuration");
        }
    };

    let mut tracing = TracingConfig::default().with_log_level(config.log_level.as_str());
    if config.log_json {
        tracing = tracing.with_json_output();
    }
    init_tracing(&tracing);
    info!(version = env!("CARGO_PKG_VERSION"), vault = %config.vault.addr, "Starting gvs");

    let client = VaultClient::new(config.vault.clone()).context("Cannot build Vault client")?;
    let reaper = Reaper::current_exe(config.max_available_time)?;

    let outcome = Pipeline::new(&config, client, reaper).run().await?;
    info!(
        path = %outcome.secret_file.display(),
        keys = outcome.keys.len(),
        kv_version = %outcome.kv_version,
        deletion = ?outcome.deletion,
        "Secret file ready"
    );
    Ok(())
}

async fn reap(path: &std::path::Path, delay_secs: u64) -> anyhow::Result<()> {
    // The reaper inherits its environment from the parent and does not load `.env`.
    let level = std::env::var("GVS_LOGLEVEL").unwrap_or_else(|_| "info".to_string());
    init_tracing(&TracingConfig::default().with_service_name("gvs-reaper").with_log_level(level));

    destruct::reap(path, Duration::from_secs(delay_secs))
        .await
        .with_context(|| format!("Cannot delete {}", path.display()))
}
