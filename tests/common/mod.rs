//! Common test utilities for deskset integration tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub const FEDORA_OS_RELEASE: &str = "NAME=\"Fedora Linux\"\nVERSION_ID=41\nID=fedora\n";

/// Every variable the binary reads, so the developer's own settings never
/// leak into a test run
const DESKSET_VARS: &[&str] = &[
    "DESKSET_SCOPE",
    "DESKSET_INSTALL_APPS",
    "DESKSET_WALLPAPERS",
    "DESKSET_STYLE",
    "DESKSET_HIDE_BOOT_MENU",
    "DESKSET_DRY_RUN",
    "DESKSET_NONINTERACTIVE",
    "DESKSET_LOG_FILE",
    "DESKSET_LOG_MAX_BYTES",
    "DESKSET_LOG_KEEP",
    "DESKSET_OS_RELEASE",
    "DESKSET_TRACE",
];

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn deskset_cmd() -> Command {
    let mut cmd = Command::cargo_bin("deskset").unwrap();
    for var in DESKSET_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// A fake host: an os-release file and a log location in a temp directory
#[allow(dead_code)]
pub struct TestHost {
    pub temp: TempDir,
    pub os_release: PathBuf,
    pub log: PathBuf,
}

#[allow(dead_code)]
impl TestHost {
    pub fn fedora() -> Self {
        Self::with_os_release(FEDORA_OS_RELEASE)
    }

    pub fn with_os_release(content: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let os_release = temp.path().join("os-release");
        fs::write(&os_release, content).expect("Failed to write os-release");
        let log = temp.path().join("log").join("deskset.log");
        Self {
            temp,
            os_release,
            log,
        }
    }

    /// `deskset` pointed at this host's os-release and log
    pub fn command(&self) -> Command {
        let mut cmd = deskset_cmd();
        cmd.env("DESKSET_OS_RELEASE", &self.os_release)
            .env("DESKSET_LOG_FILE", &self.log);
        cmd
    }

    /// A non-interactive dry run
    pub fn dry_run(&self) -> Command {
        let mut cmd = self.command();
        cmd.args(["--dry-run", "--non-interactive"]);
        cmd
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(&self.log).expect("Failed to read session log")
    }

    pub fn rotated(&self, generation: usize) -> PathBuf {
        PathBuf::from(format!("{}.{generation}", self.log.display()))
    }
}
