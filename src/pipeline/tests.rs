//! Tests for the step pipeline against an in-memory host

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use super::*;
use crate::error::{DesksetError, ErrorClass};
use crate::privilege::DryRunBroker;
use crate::ui::SilentProgressReporter;
use tempfile::TempDir;

#[derive(Debug, Default)]
struct HostState {
    packages: BTreeSet<String>,
    remotes: BTreeSet<String>,
    flatpaks: BTreeSet<String>,
    extensions: BTreeSet<String>,
    settings: BTreeMap<String, String>,
    grubenv: BTreeSet<String>,
    mutations: Vec<String>,
    fail_on: Option<String>,
    fail_query: Option<String>,
}

/// A broker whose commands act on shared in-memory state
#[derive(Debug, Clone, Default)]
struct FakeHost(Rc<RefCell<HostState>>);

fn status(ok: bool) -> CommandOutput {
    CommandOutput {
        status: Some(if ok { 0 } else { 1 }),
        ..CommandOutput::default()
    }
}

fn listing<'a>(items: impl Iterator<Item = &'a String>) -> CommandOutput {
    CommandOutput {
        stdout: items.map(|i| format!("{i}\n")).collect(),
        ..CommandOutput::ok()
    }
}

impl FakeHost {
    fn fail_on(&self, needle: &str) {
        self.0.borrow_mut().fail_on = Some(needle.to_string());
    }

    fn clear_failure(&self) {
        self.0.borrow_mut().fail_on = None;
    }

    fn fail_query(&self, needle: &str) {
        self.0.borrow_mut().fail_query = Some(needle.to_string());
    }

    fn mutations(&self) -> Vec<String> {
        self.0.borrow().mutations.clone()
    }

    fn apply(&self, argv: &[&str]) -> CommandOutput {
        let mut state = self.0.borrow_mut();
        let line = argv.join(" ");
        state.mutations.push(line.clone());
        if state.fail_on.as_deref().is_some_and(|needle| line.contains(needle)) {
            return CommandOutput {
                status: Some(1),
                stderr: "error: simulated failure\n".to_string(),
                ..CommandOutput::default()
            };
        }
        match argv {
            ["dnf", "install", "-y", packages @ ..] => {
                state.packages.extend(packages.iter().map(|p| (*p).to_string()));
            }
            ["flatpak", "remote-add", scope, "--if-not-exists", name, _url] => {
                state.remotes.insert(format!("{scope}:{name}"));
            }
            ["flatpak", "install", scope, "--noninteractive", "-y", _remote, app] => {
                state.flatpaks.insert(format!("{scope}:{app}"));
            }
            ["gnome-extensions", "enable", uuid] => {
                state.extensions.insert((*uuid).to_string());
            }
            ["gsettings", "set", schema, key, value] => {
                state.settings.insert(format!("{schema} {key}"), (*value).to_string());
            }
            ["grub2-editenv", "-", "set", pair] => {
                state.grubenv.insert((*pair).to_string());
            }
            ["grub2-mkconfig", "-o", out] => fs::write(out, "# generated\n").unwrap(),
            _ => {}
        }
        CommandOutput::ok()
    }

    fn answer(&self, argv: &[&str]) -> CommandOutput {
        let state = self.0.borrow();
        let line = argv.join(" ");
        if state.fail_query.as_deref().is_some_and(|needle| line.contains(needle)) {
            return CommandOutput {
                status: Some(1),
                stderr: "error: no session\n".to_string(),
                ..CommandOutput::default()
            };
        }
        match argv {
            ["rpm", "-q", "--quiet", package] => status(state.packages.contains(*package)),
            ["flatpak", "remotes", scope, "--columns=name"] => {
                let prefix = format!("{scope}:");
                let names: Vec<String> = state
                    .remotes
                    .iter()
                    .filter_map(|r| r.strip_prefix(&prefix).map(String::from))
                    .collect();
                listing(names.iter())
            }
            ["flatpak", "info", scope, app] => status(state.flatpaks.contains(&format!("{scope}:{app}"))),
            ["gsettings", "get", "org.gnome.shell", "enabled-extensions"] => CommandOutput {
                stdout: if state.extensions.is_empty() {
                    "@as []\n".to_string()
                } else {
                    let quoted: Vec<String> = state.extensions.iter().map(|e| format!("'{e}'")).collect();
                    format!("[{}]\n", quoted.join(", "))
                },
                ..CommandOutput::ok()
            },
            ["gsettings", "get", schema, key] => CommandOutput {
                stdout: format!(
                    "'{}'\n",
                    state.settings.get(&format!("{schema} {key}")).map_or("", String::as_str)
                ),
                ..CommandOutput::ok()
            },
            ["grub2-editenv", "-", "list"] => listing(state.grubenv.iter()),
            _ => status(false),
        }
    }
}

impl Broker for FakeHost {
    fn run(&self, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.apply(argv))
    }

    fn run_as(&self, _identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.apply(argv))
    }

    fn run_as_with_session(&self, _identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.apply(argv))
    }

    fn query(&self, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.answer(argv))
    }

    fn query_as(&self, _identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.answer(argv))
    }

    fn query_as_with_session(&self, _identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.answer(argv))
    }
}

fn alice() -> Identity {
    Identity {
        username: "alice".to_string(),
        uid: 1000,
        home: PathBuf::from("/home/alice"),
    }
}

struct Fixture {
    _temp: TempDir,
    paths: HostPaths,
    prefs: Preferences,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let grub_default = temp.path().join("grub");
    fs::write(&grub_default, "GRUB_TIMEOUT=5\nGRUB_CMDLINE_LINUX=\"rhgb quiet\"\n").unwrap();
    let paths = HostPaths {
        grub_default,
        grub_cfg: temp.path().join("grub.cfg"),
        ..HostPaths::default()
    };
    let prefs = Preferences {
        hide_boot_menu: true,
        ..Preferences::default()
    };
    Fixture {
        _temp: temp,
        paths,
        prefs,
    }
}

fn run_once(fixture: &Fixture, broker: &dyn Broker, user: Option<&Identity>, dry_run: bool) -> Ledger {
    let editor = SafeEditor::new(dry_run).unwrap();
    let ctx = StepContext {
        prefs: &fixture.prefs,
        user,
        broker,
        editor: &editor,
        paths: &fixture.paths,
    };
    let mut ledger = Ledger::quiet();
    Pipeline::standard()
        .run(&ctx, &mut ledger, &AtomicBool::new(false), &mut SilentProgressReporter)
        .unwrap();
    ledger
}

#[test]
fn test_standard_order() {
    let names: Vec<_> = Pipeline::standard().names().collect();
    assert_eq!(
        names,
        vec![
            "system-packages",
            "flathub-remote",
            "flatpak-apps",
            "shell-extensions",
            "wallpapers",
            "visual-style",
            "bootloader"
        ]
    );
}

#[test]
fn test_second_run_only_skips() {
    let fixture = fixture();
    let host = FakeHost::default();
    let user = alice();

    let first = run_once(&fixture, &host, Some(&user), false);
    assert_eq!(first.changed().len(), 7, "{:?}", first.skipped());
    assert!(first.failed().is_empty(), "{:?}", first.failed());

    let grub = fs::read_to_string(&fixture.paths.grub_default).unwrap();
    assert!(grub.contains("GRUB_TIMEOUT=0"));
    assert!(grub.contains("GRUB_TIMEOUT_STYLE=hidden"));
    assert!(grub.contains("GRUB_CMDLINE_LINUX=\"rhgb quiet\""));

    let second = run_once(&fixture, &host, Some(&user), false);
    assert!(second.changed().is_empty(), "{:?}", second.changed());
    assert!(second.failed().is_empty());
    assert_eq!(second.skipped().len(), 7);
    assert_eq!(fs::read_to_string(&fixture.paths.grub_default).unwrap(), grub);

    let mkconfig_runs = host
        .mutations()
        .iter()
        .filter(|m| m.starts_with("grub2-mkconfig"))
        .count();
    assert_eq!(mkconfig_runs, 1);
}

#[test]
fn test_failed_grub_regeneration_is_retried() {
    let fixture = fixture();
    let host = FakeHost::default();
    host.fail_on("grub2-mkconfig");
    let user = alice();

    let first = run_once(&fixture, &host, Some(&user), false);
    assert_eq!(first.failed().len(), 1, "{:?}", first.failed());
    assert!(first.failed()[0].starts_with("bootloader:"));
    assert!(!fixture.paths.grub_cfg.exists());

    host.clear_failure();
    let second = run_once(&fixture, &host, Some(&user), false);
    assert!(second.failed().is_empty(), "{:?}", second.failed());
    assert!(
        second.changed().iter().any(|m| m.starts_with("bootloader:") && m.contains("regenerated")),
        "{:?}",
        second.changed()
    );
    assert!(fixture.paths.grub_cfg.exists());

    let mkconfig_runs = host
        .mutations()
        .iter()
        .filter(|m| m.starts_with("grub2-mkconfig"))
        .count();
    assert_eq!(mkconfig_runs, 2);

    let third = run_once(&fixture, &host, Some(&user), false);
    assert!(third.changed().is_empty(), "{:?}", third.changed());
}

#[test]
fn test_unreadable_extension_list_fails_without_enabling() {
    let fixture = fixture();
    let host = FakeHost::default();
    host.fail_query("enabled-extensions");
    let user = alice();

    let ledger = run_once(&fixture, &host, Some(&user), false);

    assert_eq!(ledger.failed().len(), 1, "{:?}", ledger.failed());
    assert!(ledger.failed()[0].starts_with("shell-extensions:"));
    assert!(ledger.failed()[0].contains("no session"));
    assert!(!host.mutations().iter().any(|m| m.starts_with("gnome-extensions enable")));
}

#[test]
fn test_dry_run_records_every_step_without_mutating() {
    let fixture = fixture();
    let before = fs::read(&fixture.paths.grub_default).unwrap();
    let host = FakeHost::default();
    let broker = DryRunBroker::new(host.clone());
    let user = alice();

    let ledger = run_once(&fixture, &broker, Some(&user), true);

    assert_eq!(ledger.len(), 7);
    assert!(ledger.failed().is_empty(), "{:?}", ledger.failed());
    assert!(ledger.changed().iter().all(|m| m.contains("would")), "{:?}", ledger.changed());
    assert!(host.mutations().is_empty(), "{:?}", host.mutations());
    assert_eq!(fs::read(&fixture.paths.grub_default).unwrap(), before);
    assert!(!fixture.paths.grub_cfg.exists());
}

#[test]
fn test_failed_step_does_not_stop_later_steps() {
    let fixture = fixture();
    let host = FakeHost::default();
    host.fail_on("flatpak install");
    let user = alice();

    let ledger = run_once(&fixture, &host, Some(&user), false);

    assert_eq!(ledger.len(), 7);
    assert_eq!(ledger.failed().len(), 1);
    assert!(ledger.failed()[0].starts_with("flatpak-apps:"));
    assert!(ledger.failed()[0].contains("simulated failure"));
    assert!(ledger.changed().iter().any(|m| m.starts_with("bootloader:")));
}

#[test]
fn test_no_user_skips_user_scoped_work() {
    let mut fixture = fixture();
    fixture.prefs.scope = Scope::User;
    let host = FakeHost::default();

    let ledger = run_once(&fixture, &host, None, false);

    assert!(ledger.failed().is_empty());
    for step in ["flathub-remote", "flatpak-apps", "visual-style"] {
        assert!(
            ledger.skipped().iter().any(|m| m.starts_with(step)),
            "{step} should be skipped: {:?}",
            ledger.skipped()
        );
    }
    assert!(!host.mutations().iter().any(|m| m.starts_with("gsettings")));
}

#[test]
fn test_disabled_features_are_skipped() {
    let mut fixture = fixture();
    fixture.prefs.install_apps = false;
    fixture.prefs.wallpapers = false;
    fixture.prefs.hide_boot_menu = false;
    let host = FakeHost::default();
    let user = alice();

    let ledger = run_once(&fixture, &host, Some(&user), false);

    for step in ["flathub-remote", "flatpak-apps", "wallpapers", "bootloader"] {
        assert!(ledger.skipped().iter().any(|m| m.starts_with(step)));
    }
    assert!(!host.mutations().iter().any(|m| m.starts_with("flatpak")));
}

#[test]
fn test_user_scope_flatpak_uses_user_flag() {
    let mut fixture = fixture();
    fixture.prefs.scope = Scope::User;
    let host = FakeHost::default();
    let user = alice();

    run_once(&fixture, &host, Some(&user), false);

    let mutations = host.mutations();
    assert!(mutations.iter().any(|m| m.starts_with("flatpak remote-add --user")));
    assert!(mutations.iter().any(|m| m.starts_with("flatpak install --user")));
}

fn exploding_step(_ctx: &StepContext<'_>) -> StepOutcome {
    panic!("kaboom")
}

fn quiet_step(_ctx: &StepContext<'_>) -> StepOutcome {
    StepOutcome::Skipped("after: nothing to do".to_string())
}

#[test]
fn test_panicking_step_is_recorded_as_failure() {
    let fixture = fixture();
    let host = FakeHost::default();
    let editor = SafeEditor::new(false).unwrap();
    let ctx = StepContext {
        prefs: &fixture.prefs,
        user: None,
        broker: &host,
        editor: &editor,
        paths: &fixture.paths,
    };
    let pipeline = Pipeline::new(vec![
        Step {
            name: "boom",
            run: exploding_step,
        },
        Step {
            name: "after",
            run: quiet_step,
        },
    ]);

    let mut ledger = Ledger::quiet();
    pipeline
        .run(&ctx, &mut ledger, &AtomicBool::new(false), &mut SilentProgressReporter)
        .unwrap();

    assert_eq!(ledger.failed().len(), 1);
    assert!(ledger.failed()[0].contains("kaboom"));
    assert_eq!(ledger.skipped().to_vec(), vec!["after: nothing to do".to_string()]);
}

#[test]
fn test_interrupt_stops_before_next_step() {
    let fixture = fixture();
    let host = FakeHost::default();
    let editor = SafeEditor::new(false).unwrap();
    let ctx = StepContext {
        prefs: &fixture.prefs,
        user: None,
        broker: &host,
        editor: &editor,
        paths: &fixture.paths,
    };

    let mut ledger = Ledger::quiet();
    let err = Pipeline::standard()
        .run(&ctx, &mut ledger, &AtomicBool::new(true), &mut SilentProgressReporter)
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Interrupted);
    assert!(matches!(err, DesksetError::Interrupted { ref during } if during.contains("system-packages")));
    assert!(ledger.is_empty());
    assert!(host.mutations().is_empty());
}

#[test]
fn test_tally_precedence() {
    let mut tally = Tally::new("demo");
    assert_eq!(tally_clone_finish(&tally), StepOutcome::Skipped("demo: idle".to_string()));
    tally.changed("did a");
    assert_eq!(tally_clone_finish(&tally), StepOutcome::Changed("demo: did a".to_string()));
    tally.failed("b broke");
    tally.changed("did c");
    assert_eq!(tally.finish("idle"), StepOutcome::Failed("demo: b broke".to_string()));
}

fn tally_clone_finish(tally: &Tally) -> StepOutcome {
    Tally {
        step: tally.step,
        changed: tally.changed.clone(),
        failed: tally.failed.clone(),
    }
    .finish("idle")
}

#[test]
fn test_unquote_and_remote_parsing() {
    assert_eq!(unquote("'appmenu:close'"), "appmenu:close");
    assert_eq!(unquote("plain"), "plain");

    let out = CommandOutput {
        stdout: "fedora\nflathub\n".to_string(),
        ..CommandOutput::ok()
    };
    assert!(steps::remote::has_remote(&out, "flathub"));
    assert!(!steps::remote::has_remote(&out, "flathub-beta"));
}
