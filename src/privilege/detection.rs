//! Target user detection
//!
//! Most to least reliable: the identity the process was escalated from, the
//! first non-greeter login session, the first human account in the account
//! database. Finding nobody is not an error; user-scoped steps are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use nix::unistd::{Uid, User};

use super::Identity;
use crate::preferences::EnvMap;

/// First uid of regular human accounts
pub const HUMAN_UID_MIN: u32 = 1000;
/// First uid past the human range (systemd's dynamic/container ranges start here)
pub const HUMAN_UID_MAX: u32 = 60000;

const GREETERS: &[&str] = &["gdm", "gnome-initial-setup", "sddm", "lightdm"];
const NO_LOGIN_SHELLS: &[&str] = &["nologin", "false"];

/// A user account as listed by the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub uid: u32,
    pub home: PathBuf,
}

/// Sources consulted during detection
pub trait IdentityProbe {
    /// Username of the identity that escalated to root (or the current user
    /// when not running as root)
    fn escalation_source(&self) -> Option<String>;

    /// Usernames of active login sessions, in listing order
    fn session_users(&self) -> Vec<String>;

    /// Human-range accounts, in database order
    fn human_accounts(&self) -> Vec<Account>;

    fn lookup(&self, username: &str) -> Option<Account>;
}

/// Resolve the desktop user, or `None` when nobody can be found
pub fn detect_target_user(probe: &dyn IdentityProbe) -> Option<Identity> {
    let account = from_escalation(probe)
        .or_else(|| from_sessions(probe))
        .or_else(|| probe.human_accounts().into_iter().next());

    let account = account?;
    tracing::debug!(user = %account.username, uid = account.uid, "target user detected");
    Some(Identity {
        username: account.username,
        uid: account.uid,
        home: account.home,
    })
}

fn from_escalation(probe: &dyn IdentityProbe) -> Option<Account> {
    let name = probe.escalation_source()?;
    probe.lookup(&name).filter(|a| a.uid != 0)
}

fn from_sessions(probe: &dyn IdentityProbe) -> Option<Account> {
    probe
        .session_users()
        .iter()
        .filter(|name| !GREETERS.contains(&name.as_str()))
        .filter_map(|name| probe.lookup(name))
        .find(|a| a.uid >= HUMAN_UID_MIN)
}

/// Usernames from `loginctl list-sessions --no-legend`
/// (`SESSION UID USER SEAT TTY ...`)
pub fn parse_loginctl_sessions(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _session = columns.next()?;
            let uid: u32 = columns.next()?.parse().ok()?;
            let user = columns.next()?;
            (uid >= HUMAN_UID_MIN && !GREETERS.contains(&user)).then(|| user.to_string())
        })
        .collect()
}

/// Parse `/etc/passwd` content into accounts (all ranges)
pub fn parse_passwd(content: &str) -> Vec<(Account, String)> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 {
                return None;
            }
            let uid = fields[2].parse().ok()?;
            Some((
                Account {
                    username: fields[0].to_string(),
                    uid,
                    home: PathBuf::from(fields[5]),
                },
                fields[6].to_string(),
            ))
        })
        .collect()
}

/// Human accounts: uid in range and a login shell
pub fn human_accounts_from_passwd(content: &str) -> Vec<Account> {
    parse_passwd(content)
        .into_iter()
        .filter(|(account, shell)| {
            let shell_name = Path::new(shell)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            (HUMAN_UID_MIN..HUMAN_UID_MAX).contains(&account.uid)
                && !NO_LOGIN_SHELLS.contains(&shell_name)
        })
        .map(|(account, _)| account)
        .collect()
}

/// Probe backed by the live system
#[derive(Debug, Clone)]
pub struct SystemProbe {
    euid: u32,
    sudo_user: Option<String>,
    pkexec_uid: Option<u32>,
    passwd: PathBuf,
}

impl SystemProbe {
    pub fn new(env: &EnvMap) -> Self {
        Self {
            euid: nix::unistd::geteuid().as_raw(),
            sudo_user: env.get("SUDO_USER").cloned(),
            pkexec_uid: env.get("PKEXEC_UID").and_then(|v| v.parse().ok()),
            passwd: PathBuf::from("/etc/passwd"),
        }
    }

    fn account_from_user(user: User) -> Account {
        Account {
            username: user.name,
            uid: user.uid.as_raw(),
            home: user.dir,
        }
    }
}

impl IdentityProbe for SystemProbe {
    fn escalation_source(&self) -> Option<String> {
        if self.euid != 0 {
            return User::from_uid(Uid::from_raw(self.euid))
                .ok()
                .flatten()
                .map(|u| u.name);
        }
        if let Some(name) = self.sudo_user.as_ref().filter(|n| !n.is_empty() && *n != "root") {
            return Some(name.clone());
        }
        let uid = self.pkexec_uid.filter(|uid| *uid != 0)?;
        User::from_uid(Uid::from_raw(uid)).ok().flatten().map(|u| u.name)
    }

    fn session_users(&self) -> Vec<String> {
        let output = Command::new("loginctl")
            .args(["list-sessions", "--no-legend"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() => {
                parse_loginctl_sessions(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(_) | Err(_) => Vec::new(),
        }
    }

    fn human_accounts(&self) -> Vec<Account> {
        fs::read_to_string(&self.passwd)
            .map(|content| human_accounts_from_passwd(&content))
            .unwrap_or_default()
    }

    fn lookup(&self, username: &str) -> Option<Account> {
        User::from_name(username)
            .ok()
            .flatten()
            .map(Self::account_from_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeProbe {
        escalation: Option<String>,
        sessions: Vec<String>,
        accounts: Vec<Account>,
    }

    fn account(name: &str, uid: u32) -> Account {
        Account {
            username: name.to_string(),
            uid,
            home: PathBuf::from(format!("/home/{name}")),
        }
    }

    impl IdentityProbe for FakeProbe {
        fn escalation_source(&self) -> Option<String> {
            self.escalation.clone()
        }

        fn session_users(&self) -> Vec<String> {
            self.sessions.clone()
        }

        fn human_accounts(&self) -> Vec<Account> {
            self.accounts.clone()
        }

        fn lookup(&self, username: &str) -> Option<Account> {
            match username {
                "root" => Some(account("root", 0)),
                "gdm" => Some(account("gdm", 42)),
                "sudoer" => Some(account("sudoer", 1001)),
                "seated" => Some(account("seated", 1002)),
                "first" => Some(account("first", 1000)),
                _ => None,
            }
        }
    }

    fn full_probe() -> FakeProbe {
        FakeProbe {
            escalation: Some("sudoer".to_string()),
            sessions: vec!["gdm".to_string(), "seated".to_string()],
            accounts: vec![account("first", 1000)],
        }
    }

    #[test]
    fn test_fallback_order() {
        let mut probe = full_probe();
        assert_eq!(detect_target_user(&probe).unwrap().username, "sudoer");

        probe.escalation = None;
        assert_eq!(detect_target_user(&probe).unwrap().username, "seated");

        probe.sessions.clear();
        assert_eq!(detect_target_user(&probe).unwrap().username, "first");

        probe.accounts.clear();
        assert_eq!(detect_target_user(&probe), None);
    }

    #[test]
    fn test_root_escalation_source_ignored() {
        let probe = FakeProbe {
            escalation: Some("root".to_string()),
            ..full_probe()
        };
        assert_eq!(detect_target_user(&probe).unwrap().username, "seated");
    }

    #[test]
    fn test_greeter_only_sessions_fall_through() {
        let probe = FakeProbe {
            escalation: None,
            sessions: vec!["gdm".to_string()],
            accounts: vec![account("first", 1000)],
        };
        assert_eq!(detect_target_user(&probe).unwrap().username, "first");
    }

    #[test]
    fn test_parse_loginctl_sessions() {
        let output = "\
     c1   42 gdm    seat0 tty1
      2 1000 alice  seat0 tty2
      3 1001 bob
";
        assert_eq!(parse_loginctl_sessions(output), vec!["alice", "bob"]);
        assert!(parse_loginctl_sessions("").is_empty());
    }

    #[test]
    fn test_human_accounts_from_passwd() {
        let passwd = "\
root:x:0:0:root:/root:/bin/bash
# comment line
gdm:x:42:42::/var/lib/gdm:/sbin/nologin
svc:x:1500:1500::/srv/svc:/usr/sbin/nologin
alice:x:1000:1000:Alice:/home/alice:/bin/bash
nobody:x:65534:65534:Kernel Overflow User:/:/sbin/nologin
bob:x:1001:1001::/home/bob:/bin/zsh
broken:line
";
        let accounts = human_accounts_from_passwd(passwd);
        let names: Vec<&str> = accounts.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(accounts[0].home, PathBuf::from("/home/alice"));
    }
}
