//! Self-destruct of the secret file.
//!
//! The secret file must disappear after the exposure window even though gvs
//! exits right after writing it. Deletion is therefore handed to a detached
//! reaper: the `gvs` binary re-executed as `gvs reap --delay-secs N <path>`
//! in its own process group. Its stdin and stdout are null; stderr is
//! inherited so the outcome it logs lands in the same log stream as the
//! parent's. Nobody waits for it.
//!
//! A zero delay deletes synchronously. A failed deletion of the secret file
//! is logged, never returned: only the probe, which checks before any secret
//! exists that the directory accepts a write and a delete, fails the run.

use crate::error::{GvsError, ProbeStep};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper bound on the exposure window unless configured otherwise.
pub const DEFAULT_MAX_EXPOSURE: Duration = Duration::from_secs(180);

/// Name of the hidden reaper subcommand.
pub const REAP_SUBCOMMAND: &str = "reap";

/// Clamp a requested delay to `max`.
#[must_use]
pub fn clamp_delay(requested: Duration, max: Duration) -> Duration {
    if requested > max {
        warn!(
            requested_secs = requested.as_secs(),
            max_secs = max.as_secs(),
            "Exposure time above maximum, clamping"
        );
    }
    requested.min(max)
}

/// Probe sibling of a secret file: `<path>.tmp`.
#[must_use]
pub fn probe_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Check that the directory of `path` accepts a write and a delete.
///
/// Creates `<path>.tmp`, writes and syncs a line, then deletes it
/// synchronously. A failed write or sync still removes the probe file.
///
/// # Errors
///
/// `Probe` naming the failed step.
pub fn probe(path: &Path) -> Result<(), GvsError> {
    let probe = probe_path(path);
    let fail = |step, source| GvsError::Probe {
        step,
        path: probe.clone(),
        source,
    };

    let mut file = std::fs::File::create(&probe).map_err(|e| fail(ProbeStep::Create, e))?;

    let written = file
        .write_all(b"test\n")
        .map_err(|e| (ProbeStep::Write, e))
        .and_then(|()| file.sync_all().map_err(|e| (ProbeStep::Sync, e)));
    drop(file);

    if let Err((step, source)) = written {
        if let Err(e) = remove_now(&probe) {
            warn!(path = %probe.display(), error = %e, "Probe file left behind");
        }
        return Err(fail(step, source));
    }

    remove_now(&probe).map_err(|e| fail(ProbeStep::Delete, e))?;
    debug!(path = %probe.display(), "Secret directory probe passed");
    Ok(())
}

/// How a deletion was arranged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledDeletion {
    /// Deleted synchronously
    Deleted,
    /// Synchronous deletion failed; the file is still there and the failure
    /// was logged
    Undeleted,
    /// Handed to a detached reaper
    Detached {
        /// Reaper process id
        pid: u32,
        /// Effective delay
        delay: Duration,
    },
}

/// Spawns reapers.
#[derive(Debug, Clone)]
pub struct Reaper {
    program: PathBuf,
    max_delay: Duration,
}

impl Reaper {
    /// Reaper running `program`, which must accept the `reap` subcommand.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, max_delay: Duration) -> Self {
        Self {
            program: program.into(),
            max_delay,
        }
    }

    /// Reaper re-executing the running binary.
    ///
    /// # Errors
    ///
    /// `Config` when the path of the running binary is unknown.
    pub fn current_exe(max_delay: Duration) -> Result<Self, GvsError> {
        let program = std::env::current_exe()
            .map_err(|e| GvsError::config(format!("cannot locate own executable: {e}")))?;
        Ok(Self::new(program, max_delay))
    }

    /// Effective delay for a requested one.
    #[must_use]
    pub fn effective_delay(&self, requested: Duration) -> Duration {
        clamp_delay(requested, self.max_delay)
    }

    /// Delete `path` after `delay` (clamped), without blocking.
    ///
    /// # Errors
    ///
    /// `Schedule` when the reaper cannot be spawned. A failed zero-delay
    /// delete is logged and reported as [`ScheduledDeletion::Undeleted`].
    // The child is never waited on: it outlives gvs and init collects it.
    #[allow(clippy::zombie_processes)]
    pub fn schedule(&self, path: &Path, delay: Duration) -> Result<ScheduledDeletion, GvsError> {
        let delay = self.effective_delay(delay);
        let sched_err = |source| GvsError::Schedule {
            path: path.to_path_buf(),
            source,
        };

        if delay.is_zero() {
            return Ok(match remove_now(path) {
                Ok(()) => {
                    info!(path = %path.display(), "Secret file deleted");
                    ScheduledDeletion::Deleted
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Secret file deletion failed");
                    ScheduledDeletion::Undeleted
                }
            });
        }

        let mut command = Command::new(&self.program);
        command
            .arg(REAP_SUBCOMMAND)
            .arg("--delay-secs")
            .arg(delay.as_secs().to_string())
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(sched_err)?;
        let pid = child.id();
        info!(pid, delay_secs = delay.as_secs(), path = %path.display(), "Secret file deletion scheduled");
        Ok(ScheduledDeletion::Detached { pid, delay })
    }
}

/// Delete `path` now. A file that is already gone counts as deleted.
///
/// # Errors
///
/// Any other I/O error.
pub fn remove_now(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Reaper body: wait `delay`, then delete `path`.
///
/// # Errors
///
/// The deletion error, already logged.
pub async fn reap(path: &Path, delay: Duration) -> io::Result<()> {
    tokio::time::sleep(delay).await;
    match remove_now(path) {
        Ok(()) => {
            info!(path = %path.display(), "Secret file deleted");
            Ok(())
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Secret file deletion failed");
            Err(e)
        }
    }
}
