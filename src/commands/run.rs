//! Provisioning run: the default command
//!
//! Starting → resolving preferences → detecting the user → running steps →
//! summarizing. Usage and precondition errors return before the session log
//! is opened; anything after that closes the session with an error trailer
//! and still prints the ledger summary.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;

use crate::cli::RunArgs;
use crate::error::{DesksetError, Result, session as session_err};
use crate::host::{self, HostPaths};
use crate::ledger::Ledger;
use crate::logging::{self, LogSession, RotationCheck, SessionMeta, SessionStatus};
use crate::pipeline::{Pipeline, StepContext};
use crate::preferences::{EnvMap, InquirePrompter, PreferenceFlags, Preferences, env_map, resolve};
use crate::privilege::session::readiness_warning;
use crate::privilege::{Broker, DryRunBroker, SystemBroker, SystemProbe, detect_target_user};
use crate::transaction::SafeEditor;
use crate::ui::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};

/// Run the provisioning pipeline
pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let env = env_map(std::env::vars_os());
    let flags = PreferenceFlags::from(args);
    let paths = HostPaths::from_env(&env);
    let mut prompter = InquirePrompter;

    // Validate every override before anything else, without prompting
    let provisional = resolve(&flags, &env, false, &mut prompter)?;
    host::check_platform(&paths)?;
    host::check_privilege(provisional.dry_run, nix::unistd::geteuid().as_raw())?;

    let prefs = resolve(&flags, &env, std::io::stdin().is_terminal(), &mut prompter)?;
    host::check_tools(&prefs, |tool| which::which(tool).is_ok())?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|e| session_err::signal_handler_failed(e.to_string()))?;

    let mut session = open_session(&prefs)?;
    logging::subscriber::init(verbose, &env, session.as_ref().map(LogSession::writer));
    tracing::info!(?prefs, "preferences resolved");
    if let Some(session) = &session {
        tracing::debug!(path = %session.path().display(), "session log opened");
        if session.rotation() == RotationCheck::LockBusy {
            tracing::debug!("another run holds the rotation lock; rotation skipped");
        }
    }

    if prefs.dry_run {
        println!("{}", style("Dry run: nothing will be changed").yellow().bold());
    }

    let mut ledger = Ledger::new();
    match provision(&prefs, &paths, &env, &mut ledger, &interrupted, verbose) {
        Ok(()) => {
            ledger.summarize();
            if let Some(session) = session.as_mut() {
                session.close(&ledger.session_status())?;
            }
            println!("{}", ledger.final_message());
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            if let Some(session) = session.as_mut() {
                let status = SessionStatus::Error {
                    condition: e.to_string(),
                };
                if let Err(close_err) = session.close(&status) {
                    eprintln!("Warning: {close_err}");
                }
            }
            ledger.summarize();
            Err(e)
        }
    }
}

/// Open the session log. A dry run may go ahead without one when the log
/// is merely unwritable; a symlinked log is always refused.
fn open_session(prefs: &Preferences) -> Result<Option<LogSession>> {
    let args = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let meta = SessionMeta::current(args);
    match LogSession::open(&prefs.log, &meta) {
        Ok(session) => Ok(Some(session)),
        Err(DesksetError::LogOpenFailed { path, reason }) if prefs.dry_run => {
            eprintln!(
                "{} cannot open {path} ({reason}); continuing without a session log",
                style("Warning:").yellow().bold()
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn provision(
    prefs: &Preferences,
    paths: &HostPaths,
    env: &EnvMap,
    ledger: &mut Ledger,
    interrupted: &AtomicBool,
    verbose: bool,
) -> Result<()> {
    let system = SystemBroker::new();
    let user = detect_target_user(&SystemProbe::new(env));
    match &user {
        Some(identity) => {
            tracing::info!(user = %identity.username, uid = identity.uid, "acting for desktop user");
            let privileged = nix::unistd::geteuid().is_root();
            let access = system.session_access(identity);
            if let Some(warning) = readiness_warning(privileged, Some(identity), &access) {
                tracing::warn!("{warning}");
            }
        }
        None => tracing::warn!("no desktop user detected; user-scoped steps will be skipped"),
    }

    let editor = SafeEditor::new(prefs.dry_run)?;
    let broker: Box<dyn Broker> = if prefs.dry_run {
        Box::new(DryRunBroker::new(system))
    } else {
        Box::new(system)
    };
    let ctx = StepContext {
        prefs,
        user: user.as_ref(),
        broker: broker.as_ref(),
        editor: &editor,
        paths,
    };

    let pipeline = Pipeline::standard();
    let mut progress: Box<dyn ProgressReporter> = if std::io::stdout().is_terminal() && !verbose {
        Box::new(InteractiveProgressReporter::new(pipeline.len() as u64))
    } else {
        Box::new(SilentProgressReporter)
    };
    pipeline.run(&ctx, ledger, interrupted, progress.as_mut())
}
