//! CLI definitions using clap derive API
//!
//! - run: options for the provisioning run (the default command)
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod completions;
pub mod run;

pub use completions::CompletionsArgs;
pub use run::RunArgs;

/// deskset - desktop provisioning for Fedora workstations
#[derive(Parser, Debug)]
#[command(
    name = "deskset",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Idempotent desktop provisioning for Fedora workstations",
    long_about = "deskset installs packages, Flatpak apps, GNOME Shell extensions and wallpapers, \
                  applies a window style and optionally hides the boot menu. Every step checks \
                  the current state first, so running it again is safe.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  sudo deskset                                  \x1b[90m# Ask, then provision\x1b[0m\n   \
                  deskset --dry-run -y                          \x1b[90m# Preview with defaults\x1b[0m\n   \
                  sudo deskset --style macos --hide-boot-menu yes\n   \
                  sudo DESKSET_SCOPE=user deskset -y            \x1b[90m# Overrides via environment\x1b[0m\n"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
