//! Session bus discovery for commands that need a desktop session
//!
//! Three tiers, tried in order:
//! 1. reuse the user's running bus at `<runtime-root>/<uid>/bus`
//! 2. wrap the command in a launcher that creates a private, transient bus
//! 3. run the command bare and let it fail visibly

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use super::Identity;

/// How a session-scoped command will reach a bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAccess {
    /// The user's own bus socket is live and owned by them
    Existing(PathBuf),
    /// No bus, but this launcher can fabricate one for the invocation
    Launcher(PathBuf),
    /// Neither; the command runs without a bus (degraded)
    Unavailable,
}

/// `<runtime-root>/<uid>`
pub fn runtime_dir(runtime_root: &Path, uid: u32) -> PathBuf {
    runtime_root.join(uid.to_string())
}

/// `<runtime-root>/<uid>/bus`
pub fn bus_path(runtime_root: &Path, uid: u32) -> PathBuf {
    runtime_dir(runtime_root, uid).join("bus")
}

/// The user's bus socket, if one exists and belongs to them
pub fn existing_bus(runtime_root: &Path, uid: u32) -> Option<PathBuf> {
    let path = bus_path(runtime_root, uid);
    let meta = fs::symlink_metadata(&path).ok()?;
    (meta.file_type().is_socket() && meta.uid() == uid).then_some(path)
}

/// Decide which tier applies for `identity` right now
pub fn probe(identity: &Identity, runtime_root: &Path, launcher: Option<&Path>) -> SessionAccess {
    if let Some(bus) = existing_bus(runtime_root, identity.uid) {
        return SessionAccess::Existing(bus);
    }
    match launcher {
        Some(launcher) => SessionAccess::Launcher(launcher.to_path_buf()),
        None => SessionAccess::Unavailable,
    }
}

/// A command prepared for a session tier: the argv to run as the user and
/// the environment it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCommand {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Shape `argv` for the given tier
pub fn prepare(
    access: &SessionAccess,
    identity: &Identity,
    runtime_root: &Path,
    argv: &[&str],
) -> SessionCommand {
    let argv: Vec<String> = argv.iter().map(|a| (*a).to_string()).collect();
    match access {
        SessionAccess::Existing(bus) => SessionCommand {
            argv,
            env: vec![
                (
                    "XDG_RUNTIME_DIR".to_string(),
                    runtime_dir(runtime_root, identity.uid).display().to_string(),
                ),
                (
                    "DBUS_SESSION_BUS_ADDRESS".to_string(),
                    format!("unix:path={}", bus.display()),
                ),
            ],
        },
        SessionAccess::Launcher(launcher) => {
            let mut wrapped = vec![launcher.display().to_string(), "--".to_string()];
            wrapped.extend(argv);
            SessionCommand {
                argv: wrapped,
                env: Vec::new(),
            }
        }
        SessionAccess::Unavailable => SessionCommand {
            argv,
            env: Vec::new(),
        },
    }
}

/// Startup warning when session-scoped work is likely to fail
pub fn readiness_warning(
    privileged: bool,
    identity: Option<&Identity>,
    access: &SessionAccess,
) -> Option<String> {
    let identity = identity?;
    if !privileged || *access != SessionAccess::Unavailable {
        return None;
    }
    Some(format!(
        "No session bus for {} and no dbus-run-session available; desktop settings steps will likely fail",
        identity.username
    ))
}
