//! GNOME Shell extensions: packages system-wide, enabled per user

use crate::pipeline::catalog::{SHELL_SCHEMA, extensions_for};
use crate::pipeline::{StepContext, StepOutcome, Tally, checked, unquote};
use crate::privilege::Identity;

pub const NAME: &str = "shell-extensions";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    let extensions = extensions_for(ctx.prefs.style);
    let packages: Vec<&str> = extensions.iter().map(|e| e.package).collect();

    let mut tally = Tally::new(NAME);
    ctx.install_missing_packages(&packages, &mut tally);
    if tally.has_failures() {
        return tally.finish("");
    }

    let Some(user) = ctx.user else {
        tracing::info!("no desktop user detected; not enabling extensions");
        return tally.finish("packages present, no desktop user to enable extensions for");
    };

    let enabled = match enabled_extensions(ctx, user) {
        Ok(enabled) => enabled,
        Err(reason) => {
            tally.failed(format!("read enabled extensions for {}: {reason}", user.username));
            return tally.finish("");
        }
    };

    for extension in &extensions {
        if enabled.iter().any(|uuid| uuid == extension.uuid) {
            continue;
        }
        let argv = ["gnome-extensions", "enable", extension.uuid];
        match checked(ctx.broker.run_as_with_session(user, &argv)) {
            Ok(_) => tally.changed(format!(
                "{} {} for {}",
                ctx.action("enabled", "would enable"),
                extension.uuid,
                user.username
            )),
            Err(reason) => tally.failed(format!("enable {}: {reason}", extension.uuid)),
        }
    }
    tally.finish(&format!("all {} extensions installed and enabled", extensions.len()))
}

fn enabled_extensions(ctx: &StepContext<'_>, user: &Identity) -> Result<Vec<String>, String> {
    let argv = ["gsettings", "get", SHELL_SCHEMA, "enabled-extensions"];
    checked(ctx.broker.query_as_with_session(user, &argv)).map(|out| parse_string_list(&out.stdout))
}

/// Items of a GVariant string array as gsettings prints it
/// (`['a', 'b']`, or `@as []` when empty)
pub fn parse_string_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("@as").map_or(raw, str::trim_start);
    raw.trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
