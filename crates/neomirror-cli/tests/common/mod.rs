#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// An empty config file, so the developer's own config never leaks in.
fn empty_config() -> &'static Path {
    static CONFIG: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = CONFIG.get_or_init(|| {
        let dir = tempfile::tempdir().expect("failed to create config dir for tests");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").expect("failed to write empty config");
        (dir, path)
    });
    path
}

/// Create a configured `neomirror` command suitable for integration tests.
#[allow(dead_code)]
pub fn neomirror_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("neomirror"));
    cmd.timeout(CMD_TIMEOUT);
    for var in [
        "NEOMIRROR_DEPTH",
        "NEOMIRROR_CONCURRENCY",
        "NEOMIRROR_USER_AGENT",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NEOMIRROR_CONFIG", empty_config());
    cmd.env("NEOMIRROR_TIMEOUT", "2");
    cmd.env("NEOMIRROR_RETRIES", "0");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[allow(dead_code)]
pub fn run_json(args: &[&str]) -> serde_json::Value {
    let stdout = neomirror_cmd()
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&stdout).expect("stdout should be a JSON document")
}
