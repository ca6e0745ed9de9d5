//! deskset - desktop provisioning for Fedora workstations
//!
//! Installs packages, Flatpak apps, GNOME Shell extensions and wallpapers,
//! applies a window style and optionally hides the boot menu, as a fixed
//! sequence of idempotent steps run from root on behalf of the desktop user.

use clap::Parser;
use miette::Diagnostic;

mod cli;
mod commands;
mod error;
mod host;
mod ledger;
mod logging;
mod pipeline;
mod preferences;
mod privilege;
mod temp;
mod transaction;
mod ui;

use cli::{Cli, Commands};
use error::DesksetError;

fn report(err: &DesksetError) {
    eprintln!("Error: {err}");
    if let Some(help) = err.help() {
        eprintln!("  help: {help}");
    }
}

/// Run the selected command, returning the process exit code. Everything the
/// command owns is dropped before this returns.
fn run(cli: Cli) -> i32 {
    let result = match cli.command {
        None => commands::run::run(&cli.run, cli.verbose),
        Some(Commands::Version) => commands::version::run(),
        Some(Commands::Completions(args)) => commands::completions::run(&args),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli));
}
