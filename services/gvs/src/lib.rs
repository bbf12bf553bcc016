//! gvs seeds an application's secrets from Vault into a file that deletes
//! itself.
//!
//! A run authenticates with AppRole, works out the KV engine version of the
//! secret's mount, reads and merges the configured secrets, writes them as
//! YAML or `KEY=VALUE` lines, and hands the file to a detached reaper that
//! removes it once the exposure window has passed.

pub mod config;
pub mod destruct;
pub mod error;
pub mod output;
pub mod pipeline;

pub use config::Config;
pub use error::GvsError;
pub use pipeline::{Outcome, Pipeline, PipelineError, Stage};
