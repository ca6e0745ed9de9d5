//! Host preconditions: platform, privilege and required tools
//!
//! Checked before any step runs. Any failure here stops the run with nothing
//! attempted.

use std::fs;
use std::path::PathBuf;

use crate::error::{DesksetError, Result, host};
use crate::preferences::{EnvMap, Preferences};

pub const ENV_OS_RELEASE: &str = "DESKSET_OS_RELEASE";
pub const SUPPORTED_ID: &str = "fedora";

/// Well-known host paths the pipeline reads or edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub os_release: PathBuf,
    pub grub_default: PathBuf,
    pub grub_cfg: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
            grub_default: PathBuf::from("/etc/default/grub"),
            grub_cfg: PathBuf::from("/boot/grub2/grub.cfg"),
        }
    }
}

impl HostPaths {
    pub fn from_env(env: &EnvMap) -> Self {
        let mut paths = Self::default();
        if let Some(path) = env.get(ENV_OS_RELEASE).filter(|v| !v.trim().is_empty()) {
            paths.os_release = PathBuf::from(path);
        }
        paths
    }
}

/// `ID` and `ID_LIKE` from os-release content
pub fn parse_os_release(content: &str) -> (String, Vec<String>) {
    let mut id = String::new();
    let mut id_like = Vec::new();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key {
            "ID" => id = value.to_lowercase(),
            "ID_LIKE" => {
                id_like = value.split_whitespace().map(str::to_lowercase).collect();
            }
            _ => {}
        }
    }
    (id, id_like)
}

pub fn check_platform(paths: &HostPaths) -> Result<()> {
    let content = fs::read_to_string(&paths.os_release).map_err(|e| {
        host::os_release_unreadable(paths.os_release.display().to_string(), e.to_string())
    })?;
    let (id, id_like) = parse_os_release(&content);
    if id == SUPPORTED_ID || id_like.iter().any(|like| like == SUPPORTED_ID) {
        Ok(())
    } else {
        Err(host::unsupported(if id.is_empty() { "unknown" } else { &id }))
    }
}

/// Root is required unless nothing will be mutated
pub fn check_privilege(dry_run: bool, euid: u32) -> Result<()> {
    if dry_run || euid == 0 {
        Ok(())
    } else {
        Err(DesksetError::NotPrivileged)
    }
}

/// Tools the enabled steps cannot do without
pub fn required_tools(prefs: &Preferences) -> Vec<&'static str> {
    let mut tools = vec!["dnf", "rpm"];
    if prefs.install_apps {
        tools.push("flatpak");
    }
    tools
}

pub fn check_tools(prefs: &Preferences, available: impl Fn(&str) -> bool) -> Result<()> {
    if prefs.dry_run {
        return Ok(());
    }
    match required_tools(prefs).into_iter().find(|tool| !available(tool)) {
        Some(missing) => Err(host::missing_tool(missing)),
        None => Ok(()),
    }
}
