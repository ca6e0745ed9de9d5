//! The ordered provisioning workflow
//!
//! A fixed list of [`Step`]s runs top to bottom exactly once. Each step gets
//! a [`StepContext`] and returns one [`StepOutcome`], which the pipeline
//! records in the ledger. A failing or panicking step never stops the
//! pipeline; only an interrupt does.

pub mod catalog;
mod steps;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, session};
use crate::host::HostPaths;
use crate::ledger::{Ledger, Status};
use crate::preferences::{Preferences, Scope};
use crate::privilege::{Broker, CommandOutput, Identity};
use crate::transaction::SafeEditor;
use crate::ui::ProgressReporter;

/// Everything a step may read or act through
pub struct StepContext<'a> {
    pub prefs: &'a Preferences,
    pub user: Option<&'a Identity>,
    pub broker: &'a dyn Broker,
    pub editor: &'a SafeEditor,
    pub paths: &'a HostPaths,
}

impl StepContext<'_> {
    /// `done` for real runs, `planned` for dry runs
    pub fn action(&self, done: &str, planned: &str) -> String {
        if self.broker.is_dry_run() {
            planned.to_string()
        } else {
            done.to_string()
        }
    }

    /// `--system` or `--user`, for flatpak
    pub fn scope_flag(&self) -> &'static str {
        match self.prefs.scope {
            Scope::System => "--system",
            Scope::User => "--user",
        }
    }

    /// Identity that scoped commands need; `Err` carries the skip reason
    pub fn scoped_user(&self) -> std::result::Result<Option<&Identity>, String> {
        match (self.prefs.scope, self.user) {
            (Scope::System, _) => Ok(None),
            (Scope::User, Some(user)) => Ok(Some(user)),
            (Scope::User, None) => Err("user scope requested but no desktop user detected".to_string()),
        }
    }

    /// Mutating command in the configured install scope
    pub fn scoped_run(&self, user: Option<&Identity>, argv: &[&str]) -> Result<CommandOutput> {
        match user {
            Some(user) => self.broker.run_as(user, argv),
            None => self.broker.run(argv),
        }
    }

    /// Read-only probe in the configured install scope
    pub fn scoped_query(&self, user: Option<&Identity>, argv: &[&str]) -> Result<CommandOutput> {
        match user {
            Some(user) => self.broker.query_as(user, argv),
            None => self.broker.query(argv),
        }
    }

    /// Whether an RPM package is installed. A failed probe counts as absent.
    pub fn package_installed(&self, package: &str) -> bool {
        self.broker
            .query(&["rpm", "-q", "--quiet", package])
            .is_ok_and(|out| out.success())
    }

    /// Install whichever of `packages` are missing, noting the result
    pub fn install_missing_packages(&self, packages: &[&str], tally: &mut Tally) {
        let missing: Vec<&str> = packages
            .iter()
            .copied()
            .filter(|package| !self.package_installed(package))
            .collect();
        if missing.is_empty() {
            return;
        }

        let mut argv = vec!["dnf", "install", "-y"];
        argv.extend(&missing);
        match checked(self.broker.run(&argv)) {
            Ok(_) => tally.changed(format!(
                "{} {}",
                self.action("installed", "would install"),
                missing.join(", ")
            )),
            Err(reason) => tally.failed(format!("dnf install {}: {reason}", missing.join(" "))),
        }
    }

    /// Get-compare-set one gsettings key for `user` over the session bus
    pub fn ensure_setting(&self, user: &Identity, schema: &str, key: &str, value: &str, tally: &mut Tally) {
        let current = self
            .broker
            .query_as_with_session(user, &["gsettings", "get", schema, key])
            .ok()
            .filter(CommandOutput::success)
            .map(|out| unquote(out.stdout.trim()).to_string());
        if current.as_deref() == Some(value) {
            return;
        }

        match checked(self.broker.run_as_with_session(user, &["gsettings", "set", schema, key, value])) {
            Ok(_) => tally.changed(format!("{} {key} to {value}", self.action("set", "would set"))),
            Err(reason) => tally.failed(format!("gsettings set {schema} {key}: {reason}")),
        }
    }
}

/// Strip the GVariant string quotes gsettings prints
fn unquote(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text)
}

/// Treat non-zero exits and spawn failures alike as a failure reason
pub fn checked(result: Result<CommandOutput>) -> std::result::Result<CommandOutput, String> {
    match result {
        Ok(out) if out.success() => Ok(out),
        Ok(out) => Err(out.describe()),
        Err(e) => Err(e.to_string()),
    }
}

/// What one step did, as a single ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Changed(String),
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn status(&self) -> Status {
        match self {
            StepOutcome::Changed(_) => Status::Changed,
            StepOutcome::Skipped(_) => Status::Skipped,
            StepOutcome::Failed(_) => Status::Failed,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StepOutcome::Changed(m) | StepOutcome::Skipped(m) | StepOutcome::Failed(m) => m,
        }
    }
}

/// Collects a step's sub-operation results into one outcome: failed if
/// anything failed, else changed if anything changed, else skipped
#[derive(Debug)]
pub struct Tally {
    step: &'static str,
    changed: Vec<String>,
    failed: Vec<String>,
}

impl Tally {
    pub fn new(step: &'static str) -> Self {
        Self {
            step,
            changed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn changed(&mut self, message: impl Into<String>) {
        self.changed.push(message.into());
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        self.failed.push(message.into());
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Final outcome; `unchanged` describes the all-skipped case
    pub fn finish(self, unchanged: &str) -> StepOutcome {
        if !self.failed.is_empty() {
            StepOutcome::Failed(format!("{}: {}", self.step, self.failed.join("; ")))
        } else if !self.changed.is_empty() {
            StepOutcome::Changed(format!("{}: {}", self.step, self.changed.join("; ")))
        } else {
            StepOutcome::Skipped(format!("{}: {unchanged}", self.step))
        }
    }
}

/// A named unit of work with a fixed position in the pipeline
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub run: fn(&StepContext<'_>) -> StepOutcome,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The full provisioning sequence
    pub fn standard() -> Self {
        Self::new(vec![
            Step {
                name: steps::packages::NAME,
                run: steps::packages::run,
            },
            Step {
                name: steps::remote::NAME,
                run: steps::remote::run,
            },
            Step {
                name: steps::apps::NAME,
                run: steps::apps::run,
            },
            Step {
                name: steps::extensions::NAME,
                run: steps::extensions::run,
            },
            Step {
                name: steps::wallpaper::NAME,
                run: steps::wallpaper::run,
            },
            Step {
                name: steps::appearance::NAME,
                run: steps::appearance::run,
            },
            Step {
                name: steps::bootloader::NAME,
                run: steps::bootloader::run,
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|step| step.name)
    }

    /// Run every step once, recording one ledger entry per step.
    ///
    /// Returns an `Interrupted` error if the flag is raised; steps already
    /// recorded stay in the ledger.
    pub fn run(
        &self,
        ctx: &StepContext<'_>,
        ledger: &mut Ledger,
        interrupted: &AtomicBool,
        progress: &mut dyn ProgressReporter,
    ) -> Result<()> {
        let total = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            if interrupted.load(Ordering::SeqCst) {
                progress.abandon();
                return Err(session::interrupted(format!("before step '{}'", step.name)));
            }

            progress.start_step(step.name, index + 1, total);
            let _span = tracing::info_span!("step", name = step.name).entered();
            tracing::info!("starting");
            let outcome = run_guarded(step, ctx);
            progress.suspend(&mut || ledger.record(outcome.status(), outcome.message()));
            progress.finish_step();
        }

        if interrupted.load(Ordering::SeqCst) {
            progress.abandon();
            return Err(session::interrupted("after the last step"));
        }
        progress.finish();
        Ok(())
    }
}

/// Run a step, turning a panic into a failure outcome
fn run_guarded(step: &Step, ctx: &StepContext<'_>) -> StepOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| (step.run)(ctx))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            StepOutcome::Failed(format!("{}: step aborted unexpectedly: {reason}", step.name))
        }
    }
}

#[cfg(test)]
mod tests;
