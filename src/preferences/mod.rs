//! Configuration snapshot for one provisioning run
//!
//! The [`Preferences`] value is produced once by [`resolver::resolve`] before
//! any step runs and is only ever handed out by shared reference afterwards.

pub mod prompt;
pub mod resolver;

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

pub use prompt::{InquirePrompter, Prompter};
pub use resolver::{PreferenceFlags, resolve};

/// Environment variables as read at startup
pub type EnvMap = HashMap<String, String>;

/// Collect environment variables, dropping any name or value that is not
/// valid UTF-8
pub fn env_map(vars: impl IntoIterator<Item = (OsString, OsString)>) -> EnvMap {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

pub const DEFAULT_LOG_FILE: &str = "/var/log/deskset.log";
pub const DEFAULT_LOG_MAX_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_LOG_KEEP: usize = 5;
pub const MAX_LOG_KEEP: usize = 100;

/// Where sandboxed apps and remotes are installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// System-wide installation, run as root
    System,
    /// Per-user installation for the detected desktop user
    User,
}

/// A yes/no feature switch as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    Yes,
    No,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::Yes
    }
}

/// Window decoration and color scheme preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Stock GNOME: close button only, default color scheme
    Gnome,
    /// Buttons on the left, dark color scheme
    Macos,
    /// Minimize, maximize and close on the right, light color scheme
    Windows,
}

impl Style {
    /// Value for `org.gnome.desktop.wm.preferences button-layout`
    pub fn button_layout(self) -> &'static str {
        match self {
            Style::Gnome => "appmenu:close",
            Style::Macos => "close,minimize,maximize:appmenu",
            Style::Windows => "appmenu:minimize,maximize,close",
        }
    }

    /// Value for `org.gnome.desktop.interface color-scheme`
    pub fn color_scheme(self) -> &'static str {
        match self {
            Style::Gnome => "default",
            Style::Macos => "prefer-dark",
            Style::Windows => "prefer-light",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Style::Gnome => "GNOME (stock layout)",
            Style::Macos => "macOS-like (buttons left, dark)",
            Style::Windows => "Windows-like (buttons right, light)",
        }
    }
}

/// Name of a [`ValueEnum`] variant as accepted on the command line
pub fn value_name<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&value_name(self))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&value_name(self))
    }
}

/// Session log location and rotation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub path: PathBuf,
    /// Rotate once the log grows beyond this many bytes
    pub max_bytes: u64,
    /// Number of rotated generations kept (`.1` ..= `.keep`)
    pub keep: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_FILE),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            keep: DEFAULT_LOG_KEEP,
        }
    }
}

/// Resolved, validated choices for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub scope: Scope,
    pub install_apps: bool,
    pub wallpapers: bool,
    pub style: Style,
    pub hide_boot_menu: bool,
    pub dry_run: bool,
    /// Whether answers were (or could have been) prompted for
    pub interactive: bool,
    pub log: LogSettings,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            scope: Scope::System,
            install_apps: true,
            wallpapers: true,
            style: Style::Gnome,
            hide_boot_menu: false,
            dry_run: false,
            interactive: false,
            log: LogSettings::default(),
        }
    }
}
