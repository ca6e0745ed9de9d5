//! The Flathub remote

use crate::pipeline::catalog::{FLATHUB_NAME, FLATHUB_URL};
use crate::pipeline::{StepContext, StepOutcome, Tally, checked};
use crate::privilege::CommandOutput;

pub const NAME: &str = "flathub-remote";

/// Whether `remotes` output lists `name`
pub fn has_remote(output: &CommandOutput, name: &str) -> bool {
    output
        .lines()
        .any(|line| line.split_whitespace().next() == Some(name))
}

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    if !ctx.prefs.install_apps {
        return StepOutcome::Skipped(format!("{NAME}: app installation disabled"));
    }
    let user = match ctx.scoped_user() {
        Ok(user) => user,
        Err(reason) => return StepOutcome::Skipped(format!("{NAME}: {reason}")),
    };

    let scope = ctx.scope_flag();
    let present = ctx
        .scoped_query(user, &["flatpak", "remotes", scope, "--columns=name"])
        .is_ok_and(|out| out.success() && has_remote(&out, FLATHUB_NAME));

    let mut tally = Tally::new(NAME);
    if !present {
        let argv = [
            "flatpak",
            "remote-add",
            scope,
            "--if-not-exists",
            FLATHUB_NAME,
            FLATHUB_URL,
        ];
        match checked(ctx.scoped_run(user, &argv)) {
            Ok(_) => tally.changed(format!(
                "{} {FLATHUB_NAME} remote ({})",
                ctx.action("added", "would add"),
                ctx.prefs.scope
            )),
            Err(reason) => tally.failed(format!("flatpak remote-add {FLATHUB_NAME}: {reason}")),
        }
    }
    tally.finish(&format!("{FLATHUB_NAME} remote already configured"))
}
