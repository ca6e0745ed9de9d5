//! Persistent session log
//!
//! One append-only file shared by every invocation. Each run writes a
//! framed region into it: an opening header with pid, user, arguments and
//! start time, the run's tracing output, and a closing trailer with the final
//! status. The frame is closed exactly once, either explicitly or, for an
//! abnormal exit, when the session is dropped.

pub mod rotation;
pub mod subscriber;

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nix::fcntl::OFlag;
use serde::Serialize;

use crate::error::{Result, fs as fs_err};
use crate::preferences::LogSettings;
pub use rotation::RotationCheck;

/// Identifies one run in the log header
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub pid: u32,
    pub user: String,
    pub args: Vec<String>,
    pub started: String,
    pub version: &'static str,
}

impl SessionMeta {
    /// Metadata for the current process
    pub fn current(args: Vec<String>) -> Self {
        let user = nix::unistd::User::from_uid(nix::unistd::geteuid())
            .ok()
            .flatten()
            .map_or_else(|| nix::unistd::geteuid().to_string(), |u| u.name);
        Self {
            pid: std::process::id(),
            user,
            args,
            started: timestamp(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Final status written in the closing trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    CompletedWithFailures { failures: usize },
    Error { condition: String },
}

#[derive(Serialize)]
struct Trailer<'a> {
    pid: u32,
    ended: String,
    #[serde(flatten)]
    status: &'a SessionStatus,
}

const HEADER_PREFIX: &str = "=== deskset session start";
const TRAILER_PREFIX: &str = "=== deskset session end";

/// An open, framed log session
#[derive(Debug)]
pub struct LogSession {
    path: PathBuf,
    file: Arc<File>,
    rotation: RotationCheck,
    closed: bool,
}

impl LogSession {
    /// Rotate if needed, open the log for appending and write the header
    pub fn open(settings: &LogSettings, meta: &SessionMeta) -> Result<Self> {
        let path = settings.path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| fs_err::log_open_failed(path.display().to_string(), e.to_string()))?;
        }
        refuse_symlink(&path)?;

        let rotation = rotation::rotate_if_needed(settings)?;

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o600)
            .custom_flags(OFlag::O_NOFOLLOW.bits())
            .open(&path)
            .map_err(|e| match e.raw_os_error() {
                Some(code) if code == nix::errno::Errno::ELOOP as i32 => {
                    fs_err::log_symlink(path.display().to_string())
                }
                _ => fs_err::log_open_failed(path.display().to_string(), e.to_string()),
            })?;

        let session = Self {
            path,
            file: Arc::new(file),
            rotation,
            closed: false,
        };
        let header = serde_json::to_string(meta).map_err(|e| fs_err::io_error(e.to_string()))?;
        session.line(&format!("{HEADER_PREFIX} {header} ==="))?;
        Ok(session)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Outcome of the rotation check performed while opening
    pub fn rotation(&self) -> RotationCheck {
        self.rotation
    }

    /// Shared handle used by the tracing file layer
    pub fn writer(&self) -> Arc<File> {
        Arc::clone(&self.file)
    }

    /// Append one raw line to the log
    pub fn line(&self, text: &str) -> Result<()> {
        let mut file: &File = &self.file;
        file.write_all(format!("{text}\n").as_bytes())
            .map_err(|e| fs_err::write_failed(self.path.display().to_string(), e.to_string()))
    }

    /// Write the closing trailer; later calls are no-ops
    pub fn close(&mut self, status: &SessionStatus) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let trailer = Trailer {
            pid: std::process::id(),
            ended: timestamp(),
            status,
        };
        let body = serde_json::to_string(&trailer).map_err(|e| fs_err::io_error(e.to_string()))?;
        self.line(&format!("{TRAILER_PREFIX} {body} ==="))
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        if !self.closed {
            let status = SessionStatus::Error {
                condition: "session ended without an explicit close".to_string(),
            };
            if let Err(e) = self.close(&status) {
                eprintln!("Warning: failed to close session log: {e}");
            }
        }
    }
}

fn refuse_symlink(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            Err(fs_err::log_symlink(path.display().to_string()))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_err::log_open_failed(
            path.display().to_string(),
            e.to_string(),
        )),
    }
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}
