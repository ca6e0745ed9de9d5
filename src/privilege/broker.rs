//! Command execution on behalf of root or the desktop user

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::session::{self, SessionAccess};
use super::{Identity, RUNTIME_ROOT, display_argv};
use crate::error::{Result, session as session_err};

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result (used for simulated commands)
    pub fn ok() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Non-empty, trimmed stdout lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// One-line explanation of a failure
    pub fn describe(&self) -> String {
        let status = self
            .status
            .map_or_else(|| "killed by signal".to_string(), |c| format!("exit {c}"));
        match self.stderr.lines().map(str::trim).rfind(|l| !l.is_empty()) {
            Some(last) => format!("{status}: {last}"),
            None => status,
        }
    }
}

/// Runs commands with the right identity. Mutating operations and read-only
/// queries are separate so a dry-run broker can suppress one and keep the
/// other.
pub trait Broker {
    /// Mutating command as root
    fn run(&self, argv: &[&str]) -> Result<CommandOutput>;

    /// Mutating command as `identity`, no session needed
    fn run_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput>;

    /// Mutating command as `identity` attached to a session bus
    fn run_as_with_session(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput>;

    /// Read-only probe as root
    fn query(&self, argv: &[&str]) -> Result<CommandOutput>;

    /// Read-only probe as `identity`
    fn query_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput>;

    /// Read-only probe as `identity` attached to a session bus
    fn query_as_with_session(&self, identity: &Identity, argv: &[&str])
    -> Result<CommandOutput>;

    /// Whether mutating commands are only simulated
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Broker that spawns real processes
#[derive(Debug, Clone)]
pub struct SystemBroker {
    current_uid: u32,
    runtime_root: PathBuf,
    launcher: Option<PathBuf>,
}

impl SystemBroker {
    pub fn new() -> Self {
        Self {
            current_uid: nix::unistd::geteuid().as_raw(),
            runtime_root: PathBuf::from(RUNTIME_ROOT),
            launcher: which::which("dbus-run-session").ok(),
        }
    }

    #[cfg(test)]
    pub fn with_paths(current_uid: u32, runtime_root: PathBuf, launcher: Option<PathBuf>) -> Self {
        Self {
            current_uid,
            runtime_root,
            launcher,
        }
    }

    pub fn launcher(&self) -> Option<&Path> {
        self.launcher.as_deref()
    }

    /// Which session tier a command for `identity` would use right now
    pub fn session_access(&self, identity: &Identity) -> SessionAccess {
        session::probe(identity, &self.runtime_root, self.launcher())
    }

    /// Argument vector that runs `argv` as `identity` with `env` set
    pub fn user_argv(
        &self,
        identity: &Identity,
        argv: &[String],
        env: &[(String, String)],
    ) -> Vec<String> {
        let mut full = Vec::new();
        if self.current_uid != identity.uid {
            full.extend(["runuser", "-u", identity.username.as_str(), "--"].map(String::from));
            full.push("env".to_string());
            full.push(format!("HOME={}", identity.home.display()));
            full.push(format!("USER={}", identity.username));
        } else if !env.is_empty() {
            full.push("env".to_string());
        }
        full.extend(env.iter().map(|(k, v)| format!("{k}={v}")));
        full.extend(argv.iter().cloned());
        full
    }

    fn execute(&self, argv: &[String]) -> Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(session_err::spawn_failed("", "empty command"));
        };
        tracing::debug!(command = %display_argv(argv), "running");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| session_err::spawn_failed(program.as_str(), e.to_string()))?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            command = %display_argv(argv),
            status = ?result.status,
            stdout = %result.stdout.trim_end(),
            stderr = %result.stderr.trim_end(),
            "finished"
        );
        Ok(result)
    }

    fn execute_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        let argv: Vec<String> = argv.iter().map(|a| (*a).to_string()).collect();
        self.execute(&self.user_argv(identity, &argv, &[]))
    }

    fn execute_with_session(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        let access = self.session_access(identity);
        if access == SessionAccess::Unavailable {
            tracing::warn!(
                user = %identity.username,
                command = %display_argv(argv),
                "no session bus available; running without one"
            );
        }
        let prepared = session::prepare(&access, identity, &self.runtime_root, argv);
        self.execute(&self.user_argv(identity, &prepared.argv, &prepared.env))
    }
}

impl Default for SystemBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for SystemBroker {
    fn run(&self, argv: &[&str]) -> Result<CommandOutput> {
        let argv: Vec<String> = argv.iter().map(|a| (*a).to_string()).collect();
        self.execute(&argv)
    }

    fn run_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        self.execute_as(identity, argv)
    }

    fn run_as_with_session(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        self.execute_with_session(identity, argv)
    }

    fn query(&self, argv: &[&str]) -> Result<CommandOutput> {
        self.run(argv)
    }

    fn query_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        self.execute_as(identity, argv)
    }

    fn query_as_with_session(
        &self,
        identity: &Identity,
        argv: &[&str],
    ) -> Result<CommandOutput> {
        self.execute_with_session(identity, argv)
    }
}
