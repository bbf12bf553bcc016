//! Shared test utilities for gvs crates.
//!
//! This crate provides:
//! - A wiremock-backed Vault stub
//! - JSON fixtures for the Vault endpoints gvs calls
//! - Proptest generators for secret keys, values and paths

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::VaultStub;
