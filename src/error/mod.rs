//! Error types and handling for deskset
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`preference`]: invalid flag / environment values
//! - [`host`]: platform, privilege and tool preconditions
//! - [`fs`]: file system, backup and log file errors
//! - [`session`]: command spawning and prompt errors
//!
//! Step failures are not errors: they are recorded in the ledger and the
//! pipeline keeps going. Everything in this enum either stops the run before
//! any step executes or escalates to the top-level exit handler.

pub mod fs;
pub mod host;
pub mod preference;
pub mod session;

use miette::Diagnostic;
use thiserror::Error;

/// How an error affects the process, mirroring the four failure classes
/// the orchestrator distinguishes (step failures never become errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid flag or environment value; nothing has run yet.
    Usage,
    /// Wrong host, missing tool or missing privilege; no steps attempted.
    Precondition,
    /// Anything unanticipated, caught by the top-level handler.
    Runtime,
    /// SIGINT / SIGTERM received while running.
    Interrupted,
}

/// Main error type for deskset operations
#[derive(Error, Diagnostic, Debug)]
pub enum DesksetError {
    // Preference errors
    #[error("invalid value '{value}' for {field} (allowed: {allowed})")]
    #[diagnostic(
        code(deskset::preference::invalid),
        help("Pass one of the allowed values on the command line or in the environment")
    )]
    InvalidPreference {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("invalid value '{value}' for {field}: {reason}")]
    #[diagnostic(code(deskset::preference::log_setting))]
    InvalidLogSetting {
        field: String,
        value: String,
        reason: String,
    },

    // Host errors
    #[error("Unsupported host '{id}': deskset only provisions Fedora systems")]
    #[diagnostic(code(deskset::host::unsupported))]
    UnsupportedHost { id: String },

    #[error("Failed to read host release file: {path}: {reason}")]
    #[diagnostic(code(deskset::host::os_release))]
    OsReleaseUnreadable { path: String, reason: String },

    #[error("deskset must be run as root")]
    #[diagnostic(
        code(deskset::host::not_privileged),
        help("Re-run with sudo, or pass --dry-run to preview without privileges")
    )]
    NotPrivileged,

    #[error("Required tool not found on PATH: {tool}")]
    #[diagnostic(code(deskset::host::missing_tool))]
    MissingTool { tool: String },

    // File system errors
    #[error("Refusing to write log through symbolic link: {path}")]
    #[diagnostic(
        code(deskset::fs::log_symlink),
        help("Remove the link or point DESKSET_LOG_FILE at a regular file")
    )]
    LogIsSymlink { path: String },

    #[error("Failed to open log file: {path}: {reason}")]
    #[diagnostic(code(deskset::fs::log_open))]
    LogOpenFailed { path: String, reason: String },

    #[error("Failed to create temporary area: {reason}")]
    #[diagnostic(code(deskset::fs::temp_area))]
    TempAreaFailed { reason: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(deskset::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(deskset::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("Failed to back up {path}: {reason}")]
    #[diagnostic(code(deskset::fs::backup_failed))]
    BackupFailed { path: String, reason: String },

    #[error("Failed to restore {path} from backup: {reason}")]
    #[diagnostic(
        code(deskset::fs::restore_failed),
        help("The backup is kept in the temporary area until the process exits")
    )]
    RestoreFailed { path: String, reason: String },

    #[error("Edit of {path} failed: {reason}")]
    #[diagnostic(code(deskset::fs::edit_failed))]
    EditFailed { path: String, reason: String },

    // Session errors
    #[error("Failed to start '{program}': {reason}")]
    #[diagnostic(code(deskset::session::spawn_failed))]
    CommandSpawnFailed { program: String, reason: String },

    #[error("Prompt failed: {message}")]
    #[diagnostic(code(deskset::session::prompt_failed))]
    PromptFailed { message: String },

    #[error("Failed to install signal handler: {reason}")]
    #[diagnostic(code(deskset::session::signal_handler))]
    SignalHandlerFailed { reason: String },

    #[error("Interrupted {during}")]
    #[diagnostic(code(deskset::session::interrupted))]
    Interrupted { during: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(deskset::fs::io_error))]
    IoError { message: String },
}

impl DesksetError {
    /// Failure class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidPreference { .. } | Self::InvalidLogSetting { .. } => ErrorClass::Usage,
            Self::UnsupportedHost { .. }
            | Self::OsReleaseUnreadable { .. }
            | Self::NotPrivileged
            | Self::MissingTool { .. } => ErrorClass::Precondition,
            Self::Interrupted { .. } => ErrorClass::Interrupted,
            _ => ErrorClass::Runtime,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::Usage => 2,
            ErrorClass::Precondition | ErrorClass::Runtime => 1,
            ErrorClass::Interrupted => 130,
        }
    }
}

impl From<std::io::Error> for DesksetError {
    fn from(err: std::io::Error) -> Self {
        DesksetError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for DesksetError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationInterrupted
            | inquire::InquireError::OperationCanceled => DesksetError::Interrupted {
                during: "while prompting".to_string(),
            },
            other => DesksetError::PromptFailed {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, DesksetError>;
