//! Base RPM packages

use crate::pipeline::catalog::SYSTEM_PACKAGES;
use crate::pipeline::{StepContext, StepOutcome, Tally};

pub const NAME: &str = "system-packages";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    let mut tally = Tally::new(NAME);
    ctx.install_missing_packages(SYSTEM_PACKAGES, &mut tally);
    tally.finish(&format!("all {} base packages present", SYSTEM_PACKAGES.len()))
}
