//! Wallpaper packages and the desktop background

use crate::pipeline::catalog::{WALLPAPER_PACKAGES, WALLPAPER_SCHEMA, WALLPAPER_URI, WALLPAPER_URI_DARK};
use crate::pipeline::{StepContext, StepOutcome, Tally};

pub const NAME: &str = "wallpapers";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    if !ctx.prefs.wallpapers {
        return StepOutcome::Skipped(format!("{NAME}: wallpapers disabled"));
    }

    let mut tally = Tally::new(NAME);
    ctx.install_missing_packages(WALLPAPER_PACKAGES, &mut tally);
    if tally.has_failures() {
        return tally.finish("");
    }

    let Some(user) = ctx.user else {
        return tally.finish("packages present, no desktop user to set the background for");
    };
    ctx.ensure_setting(user, WALLPAPER_SCHEMA, "picture-uri", WALLPAPER_URI, &mut tally);
    ctx.ensure_setting(user, WALLPAPER_SCHEMA, "picture-uri-dark", WALLPAPER_URI_DARK, &mut tally);
    tally.finish("background already set")
}
