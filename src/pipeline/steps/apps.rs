//! Flatpak applications

use crate::pipeline::catalog::{FLATHUB_NAME, FLATPAK_APPS};
use crate::pipeline::{StepContext, StepOutcome, Tally, checked};

pub const NAME: &str = "flatpak-apps";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    if !ctx.prefs.install_apps {
        return StepOutcome::Skipped(format!("{NAME}: app installation disabled"));
    }
    let user = match ctx.scoped_user() {
        Ok(user) => user,
        Err(reason) => return StepOutcome::Skipped(format!("{NAME}: {reason}")),
    };
    let scope = ctx.scope_flag();

    let mut tally = Tally::new(NAME);
    for app in FLATPAK_APPS {
        let installed = ctx
            .scoped_query(user, &["flatpak", "info", scope, app])
            .is_ok_and(|out| out.success());
        if installed {
            continue;
        }
        let argv = [
            "flatpak",
            "install",
            scope,
            "--noninteractive",
            "-y",
            FLATHUB_NAME,
            app,
        ];
        match checked(ctx.scoped_run(user, &argv)) {
            Ok(_) => tally.changed(format!("{} {app}", ctx.action("installed", "would install"))),
            Err(reason) => tally.failed(format!("flatpak install {app}: {reason}")),
        }
    }
    tally.finish(&format!("all {} apps installed", FLATPAK_APPS.len()))
}
