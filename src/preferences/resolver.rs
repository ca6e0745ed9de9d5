//! Preference resolution
//!
//! Per field: explicit flag > environment override > prompted answer (only
//! when interactive) > built-in default. All environment values are parsed
//! and validated before the first question is asked, so a bad override never
//! reaches the prompt stage, let alone a privileged step.

use std::path::PathBuf;

use clap::ValueEnum;

use super::{EnvMap, LogSettings, MAX_LOG_KEEP, Preferences, Prompter, Scope, Style, Toggle, value_name};
use crate::error::{Result, preference};

pub const ENV_SCOPE: &str = "DESKSET_SCOPE";
pub const ENV_INSTALL_APPS: &str = "DESKSET_INSTALL_APPS";
pub const ENV_WALLPAPERS: &str = "DESKSET_WALLPAPERS";
pub const ENV_STYLE: &str = "DESKSET_STYLE";
pub const ENV_HIDE_BOOT_MENU: &str = "DESKSET_HIDE_BOOT_MENU";
pub const ENV_DRY_RUN: &str = "DESKSET_DRY_RUN";
pub const ENV_NONINTERACTIVE: &str = "DESKSET_NONINTERACTIVE";
pub const ENV_LOG_FILE: &str = "DESKSET_LOG_FILE";
pub const ENV_LOG_MAX_BYTES: &str = "DESKSET_LOG_MAX_BYTES";
pub const ENV_LOG_KEEP: &str = "DESKSET_LOG_KEEP";

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceFlags {
    pub scope: Option<Scope>,
    pub apps: Option<Toggle>,
    pub wallpapers: Option<Toggle>,
    pub style: Option<Style>,
    pub hide_boot_menu: Option<Toggle>,
    pub dry_run: bool,
    pub non_interactive: bool,
    pub log_file: Option<PathBuf>,
}

impl PreferenceFlags {
    /// Supplying any preference on the command line makes the run non-interactive
    pub fn any_preference(&self) -> bool {
        self.scope.is_some()
            || self.apps.is_some()
            || self.wallpapers.is_some()
            || self.style.is_some()
            || self.hide_boot_menu.is_some()
    }
}

/// Produce the configuration snapshot for this run
pub fn resolve(
    flags: &PreferenceFlags,
    env: &EnvMap,
    stdin_is_terminal: bool,
    prompter: &mut dyn Prompter,
) -> Result<Preferences> {
    let defaults = Preferences::default();

    let scope = layered(flags.scope, env, ENV_SCOPE)?;
    let apps = layered(flags.apps, env, ENV_INSTALL_APPS)?;
    let wallpapers = layered(flags.wallpapers, env, ENV_WALLPAPERS)?;
    let style = layered(flags.style, env, ENV_STYLE)?;
    let hide_boot_menu = layered(flags.hide_boot_menu, env, ENV_HIDE_BOOT_MENU)?;

    let dry_run = flags.dry_run || env_toggle(env, ENV_DRY_RUN)?;
    let forced_batch = flags.non_interactive || env_toggle(env, ENV_NONINTERACTIVE)?;
    let log = resolve_log_settings(flags, env)?;

    let interactive = stdin_is_terminal && !forced_batch && !flags.any_preference();
    let mut answers = Answers {
        prompter,
        interactive,
    };

    let scope = match scope {
        Some(value) => value,
        None => answers.choose(
            "Install apps system-wide or only for the desktop user?",
            defaults.scope,
            |s| s.to_string(),
        )?,
    };
    let install_apps = match apps {
        Some(value) => value.into(),
        None => answers.confirm("Install the optional app bundle?", defaults.install_apps)?,
    };
    let wallpapers = match wallpapers {
        Some(value) => value.into(),
        None => answers.confirm("Install the wallpaper set?", defaults.wallpapers)?,
    };
    let style = match style {
        Some(value) => value,
        None => answers.choose("Choose a window style", defaults.style, |s| {
            s.description().to_string()
        })?,
    };
    let hide_boot_menu = match hide_boot_menu {
        Some(value) => value.into(),
        None => answers.confirm("Hide the boot menu?", defaults.hide_boot_menu)?,
    };

    Ok(Preferences {
        scope,
        install_apps,
        wallpapers,
        style,
        hide_boot_menu,
        dry_run,
        interactive,
        log,
    })
}

struct Answers<'p> {
    prompter: &'p mut dyn Prompter,
    interactive: bool,
}

impl Answers<'_> {
    fn choose<T>(&mut self, question: &str, default: T, label: impl Fn(T) -> String) -> Result<T>
    where
        T: ValueEnum + Copy + PartialEq,
    {
        if !self.interactive {
            return Ok(default);
        }
        let variants = T::value_variants();
        let options: Vec<String> = variants.iter().map(|v| label(*v)).collect();
        let start = variants.iter().position(|v| *v == default).unwrap_or(0);
        let index = self.prompter.select(question, &options, start)?;
        Ok(variants.get(index).copied().unwrap_or(default))
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        if !self.interactive {
            return Ok(default);
        }
        self.prompter.confirm(question, default)
    }
}

/// Flag if given, else the environment override (validated), else nothing
fn layered<T: ValueEnum + Copy>(flag: Option<T>, env: &EnvMap, key: &str) -> Result<Option<T>> {
    match flag {
        Some(value) => Ok(Some(value)),
        None => parse_env(env, key),
    }
}

fn parse_env<T: ValueEnum>(env: &EnvMap, key: &str) -> Result<Option<T>> {
    let Some(raw) = env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    T::from_str(raw, true).map(Some).map_err(|_| {
        let allowed: Vec<String> = T::value_variants().iter().map(value_name).collect();
        preference::invalid(key, raw, &allowed)
    })
}

fn env_toggle(env: &EnvMap, key: &str) -> Result<bool> {
    Ok(parse_env::<Toggle>(env, key)?.is_some_and(bool::from))
}

fn resolve_log_settings(flags: &PreferenceFlags, env: &EnvMap) -> Result<LogSettings> {
    let defaults = LogSettings::default();

    let path = match &flags.log_file {
        Some(path) => path.clone(),
        None => env
            .get(ENV_LOG_FILE)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map_or(defaults.path, PathBuf::from),
    };

    let max_bytes = match env.get(ENV_LOG_MAX_BYTES) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                preference::invalid_log_setting(
                    ENV_LOG_MAX_BYTES,
                    raw.as_str(),
                    "expected a positive number of bytes",
                )
            })?,
        None => defaults.max_bytes,
    };

    let keep = match env.get(ENV_LOG_KEEP) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|v| (1..=MAX_LOG_KEEP).contains(v))
            .ok_or_else(|| {
                preference::invalid_log_setting(
                    ENV_LOG_KEEP,
                    raw.as_str(),
                    format!("expected a whole number from 1 to {MAX_LOG_KEEP}"),
                )
            })?,
        None => defaults.keep,
    };

    Ok(LogSettings {
        path,
        max_bytes,
        keep,
    })
}
