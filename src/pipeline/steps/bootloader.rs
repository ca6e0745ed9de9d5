//! Hidden GRUB boot menu

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::pipeline::catalog::GRUB_HIDDEN_MENU;
use crate::pipeline::{StepContext, StepOutcome, Tally, checked};
use crate::transaction::EditOutcome;
use crate::transaction::keyfile::{apply_assignments, has_assignments};

pub const NAME: &str = "bootloader";

const AUTO_HIDE: &str = "menu_auto_hide=1";

pub fn run(ctx: &StepContext<'_>) -> StepOutcome {
    if !ctx.prefs.hide_boot_menu {
        return StepOutcome::Skipped(format!("{NAME}: boot menu left unchanged"));
    }

    let mut tally = Tally::new(NAME);
    let path = &ctx.paths.grub_default;
    let current = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            tally.failed(format!("read {}: {e}", path.display()));
            return tally.finish("");
        }
    };

    let mut edited = false;
    if !has_assignments(&current, GRUB_HIDDEN_MENU) {
        match ctx.editor.edit(path, |p| apply_assignments(p, GRUB_HIDDEN_MENU)) {
            Ok(EditOutcome::Unchanged) => {}
            Ok(EditOutcome::Changed | EditOutcome::Simulated) => {
                edited = true;
                tally.changed(format!(
                    "{} GRUB_TIMEOUT=0 GRUB_TIMEOUT_STYLE=hidden in {}",
                    ctx.action("set", "would set"),
                    path.display()
                ));
            }
            Err(e) => tally.failed(e.to_string()),
        }
    }

    let auto_hidden = ctx
        .broker
        .query(&["grub2-editenv", "-", "list"])
        .is_ok_and(|out| out.success() && out.lines().any(|line| line == AUTO_HIDE));
    if !auto_hidden {
        match checked(ctx.broker.run(&["grub2-editenv", "-", "set", AUTO_HIDE])) {
            Ok(_) => tally.changed(format!("{} {AUTO_HIDE}", ctx.action("set", "would set"))),
            Err(reason) => tally.failed(format!("grub2-editenv set {AUTO_HIDE}: {reason}")),
        }
    }

    if edited || config_outdated(path, &ctx.paths.grub_cfg) {
        let cfg = ctx.paths.grub_cfg.display().to_string();
        match checked(ctx.broker.run(&["grub2-mkconfig", "-o", &cfg])) {
            Ok(_) => tally.changed(format!("{} {cfg}", ctx.action("regenerated", "would regenerate"))),
            Err(reason) => tally.failed(format!("grub2-mkconfig: {reason}")),
        }
    }

    tally.finish("boot menu already hidden")
}

/// Whether the generated config is missing or predates its source. A failed
/// regeneration in an earlier run leaves it that way, so the next run retries.
pub fn config_outdated(source: &Path, generated: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|meta| meta.modified());
    match (modified(source), modified(generated)) {
        (_, Err(_)) => true,
        (Ok(source), Ok(generated)) => generated < source,
        (Err(_), Ok(_)) => false,
    }
}
