//! Window buttons and color scheme for the chosen style

use crate::pipeline::catalog::{INTERFACE_SCHEMA, WM_SCHEMA};
use crate::pipeline::{StepContext, StepOutcome, Tally};

pub const NAME: &str = "visual-style";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    let Some(user) = ctx.user else {
        return StepOutcome::Skipped(format!("{NAME}: no desktop user detected"));
    };
    let style = ctx.prefs.style;

    let mut tally = Tally::new(NAME);
    ctx.ensure_setting(user, WM_SCHEMA, "button-layout", style.button_layout(), &mut tally);
    ctx.ensure_setting(user, INTERFACE_SCHEMA, "color-scheme", style.color_scheme(), &mut tally);
    tally.finish(&format!("{style} style already applied"))
}
