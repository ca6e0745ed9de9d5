//! Idempotent `KEY=value` edits for shell-style configuration files such as
//! `/etc/default/grub`

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, fs as fs_err};

/// Return `content` with each key set to its value: existing assignments are
/// rewritten in place, missing ones appended. Commented-out lines are left
/// alone.
pub fn set_assignments(content: &str, pairs: &[(&str, &str)]) -> String {
    let mut seen = vec![false; pairs.len()];
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                return line.to_string();
            }
            let Some((key, _)) = trimmed.split_once('=') else {
                return line.to_string();
            };
            match pairs.iter().position(|(k, _)| *k == key.trim()) {
                Some(index) => {
                    seen[index] = true;
                    format!("{}={}", pairs[index].0, pairs[index].1)
                }
                None => line.to_string(),
            }
        })
        .collect();

    for ((key, value), present) in pairs.iter().zip(&seen) {
        if !present {
            lines.push(format!("{key}={value}"));
        }
    }

    let mut updated = lines.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    updated
}

/// Whether every key already has its value
pub fn has_assignments(content: &str, pairs: &[(&str, &str)]) -> bool {
    set_assignments(content, pairs) == normalized(content)
}

fn normalized(content: &str) -> String {
    let mut text = content.lines().collect::<Vec<_>>().join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Edit function for [`super::SafeEditor::edit`]: apply the assignments to
/// the file, writing only when something differs
pub fn apply_assignments(path: &Path, pairs: &[(&str, &str)]) -> Result<bool> {
    let current = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(fs_err::read_failed(path.display().to_string(), e.to_string())),
    };
    if has_assignments(&current, pairs) {
        return Ok(false);
    }
    fs::write(path, set_assignments(&current, pairs))
        .map_err(|e| fs_err::write_failed(path.display().to_string(), e.to_string()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GRUB: &str = "\
GRUB_TIMEOUT=5
GRUB_DISTRIBUTOR=\"$(sed 's, release .*$,,g' /etc/system-release)\"
# GRUB_TIMEOUT_STYLE=menu
GRUB_CMDLINE_LINUX=\"rhgb quiet\"
";

    #[test]
    fn test_updates_present_and_appends_missing() {
        let updated = set_assignments(
            GRUB,
            &[("GRUB_TIMEOUT", "0"), ("GRUB_TIMEOUT_STYLE", "hidden")],
        );
        assert!(updated.starts_with("GRUB_TIMEOUT=0\n"));
        assert!(updated.contains("# GRUB_TIMEOUT_STYLE=menu\n"));
        assert!(updated.ends_with("GRUB_TIMEOUT_STYLE=hidden\n"));
        assert_eq!(updated.matches("GRUB_TIMEOUT=").count(), 1);
        assert!(updated.contains("GRUB_CMDLINE_LINUX=\"rhgb quiet\"\n"));
    }

    #[test]
    fn test_reapplying_is_a_no_op() {
        let pairs = [("GRUB_TIMEOUT", "0"), ("GRUB_TIMEOUT_STYLE", "hidden")];
        let once = set_assignments(GRUB, &pairs);
        let twice = set_assignments(&once, &pairs);
        assert_eq!(once, twice);
        assert!(has_assignments(&once, &pairs));
        assert!(!has_assignments(GRUB, &pairs));
    }

    #[test]
    fn test_apply_assignments_reports_changes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("grub");
        fs::write(&path, GRUB).unwrap();
        let pairs = [("GRUB_TIMEOUT", "0")];

        assert!(apply_assignments(&path, &pairs).unwrap());
        assert!(!apply_assignments(&path, &pairs).unwrap());
        assert!(fs::read_to_string(&path).unwrap().starts_with("GRUB_TIMEOUT=0\n"));
    }

    #[test]
    fn test_missing_file_is_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh");
        assert!(apply_assignments(&path, &[("A", "1")]).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\n");
    }
}
