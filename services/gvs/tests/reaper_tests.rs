//! The detached reaper, run through the real `gvs` binary.

use gvs::destruct::{Reaper, ScheduledDeletion};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

const GVS_BIN: &str = env!("CARGO_BIN_EXE_gvs");

async fn wait_until_gone(path: &Path, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    !path.exists()
}

#[tokio::test]
async fn test_detached_reaper_deletes_after_delay() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("gvs");
    std::fs::write(&target, "K=V\n").unwrap();

    let reaper = Reaper::new(GVS_BIN, Duration::from_secs(180));
    let outcome = reaper.schedule(&target, Duration::from_secs(1)).unwrap();
    assert!(matches!(outcome, ScheduledDeletion::Detached { .. }));
    assert!(target.exists());

    assert!(wait_until_gone(&target, Duration::from_secs(10)).await);
}

#[tokio::test]
async fn test_excessive_delay_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("gvs");
    std::fs::write(&target, "K=V\n").unwrap();

    let reaper = Reaper::new(GVS_BIN, Duration::from_secs(1));
    let outcome = reaper.schedule(&target, Duration::from_secs(99_999)).unwrap();
    match outcome {
        ScheduledDeletion::Detached { delay, .. } => assert_eq!(delay, Duration::from_secs(1)),
        other => panic!("expected a detached reaper, got {other:?}"),
    }

    assert!(wait_until_gone(&target, Duration::from_secs(10)).await);
}

#[test]
fn test_reap_subcommand_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let status = Command::new(GVS_BIN)
        .args(["reap", "--delay-secs", "0"])
        .arg(dir.path().join("already-gone"))
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn test_reap_failure_is_logged_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("gvs");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep"), "x").unwrap();

    let output = Command::new(GVS_BIN)
        .args(["reap", "--delay-secs", "0"])
        .arg(&target)
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Secret file deletion failed"), "stderr: {stderr}");
    assert!(target.exists());
}

#[test]
fn test_run_without_configuration_fails() {
    let status = Command::new(GVS_BIN)
        .env_clear()
        .current_dir(tempfile::tempdir().unwrap().path())
        .status()
        .unwrap();
    assert!(!status.success());
}
