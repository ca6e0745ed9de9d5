use std::path::PathBuf;

use clap::Args;

use crate::preferences::{PreferenceFlags, Scope, Style, Toggle};

/// Options for a provisioning run
///
/// Every preference left unset here falls back to its `DESKSET_*`
/// environment override, then to a prompt, then to the default.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Install apps system-wide or for the desktop user only
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,

    /// Install the optional Flatpak app bundle
    #[arg(long, value_enum, value_name = "yes|no")]
    pub apps: Option<Toggle>,

    /// Install wallpapers and set the desktop background
    #[arg(long, value_enum, value_name = "yes|no")]
    pub wallpapers: Option<Toggle>,

    /// Window button layout and color scheme
    #[arg(long, value_enum)]
    pub style: Option<Style>,

    /// Hide the GRUB menu at boot
    #[arg(long, value_enum, value_name = "yes|no")]
    pub hide_boot_menu: Option<Toggle>,

    /// Never prompt; use flags, environment and defaults only
    #[arg(long, short = 'y')]
    pub non_interactive: bool,

    /// Session log location (default: /var/log/deskset.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl From<&RunArgs> for PreferenceFlags {
    fn from(args: &RunArgs) -> Self {
        Self {
            scope: args.scope,
            apps: args.apps,
            wallpapers: args.wallpapers,
            style: args.style,
            hide_boot_menu: args.hide_boot_menu,
            dry_run: args.dry_run,
            non_interactive: args.non_interactive,
            log_file: args.log_file.clone(),
        }
    }
}
