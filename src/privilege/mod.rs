//! Privilege and session brokering
//!
//! Resolves the desktop user the orchestrator acts for and runs external
//! commands as root, as that user, or as that user attached to a session bus.
//! - [`detection`]: who the target user is
//! - [`session`]: session-bus discovery, fabrication and degradation
//! - [`broker`]: the [`Broker`] seam and the process-spawning implementation
//! - [`dry_run`]: a broker that only pretends to mutate

pub mod broker;
pub mod detection;
pub mod dry_run;
pub mod session;

use std::path::PathBuf;

pub use broker::{Broker, CommandOutput, SystemBroker};
pub use detection::{IdentityProbe, SystemProbe, detect_target_user};
pub use dry_run::DryRunBroker;
pub use session::SessionAccess;

/// Conventional parent of per-user runtime directories
pub const RUNTIME_ROOT: &str = "/run/user";

/// The non-privileged desktop user commands are run for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub uid: u32,
    pub home: PathBuf,
}

/// Render an argument vector for logs and dry-run notices
pub fn display_argv<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('\'') {
                format!("'{}'", arg.replace('\'', r"'\''"))
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
