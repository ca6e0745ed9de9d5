//! Size-triggered log rotation under a non-blocking exclusive lock
//!
//! The lock file sits next to the log (`<log>.lock`) and only exists while a
//! rotation check is in progress. A process that cannot take the lock skips
//! rotation for its run instead of waiting.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use nix::fcntl::OFlag;

use crate::error::{Result, fs as fs_err};
use crate::preferences::LogSettings;

/// What happened during a rotation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationCheck {
    Rotated,
    NotNeeded,
    /// Another invocation held the lock; rotation skipped for this run
    LockBusy,
}

/// `<log>.lock`
pub fn lock_path(log: &Path) -> PathBuf {
    suffixed(log, "lock")
}

/// `<log>.<generation>`, generation 1 being the most recent
pub fn rotated_path(log: &Path, generation: usize) -> PathBuf {
    suffixed(log, &generation.to_string())
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Rotate the log if it has grown beyond `settings.max_bytes`
pub fn rotate_if_needed(settings: &LogSettings) -> Result<RotationCheck> {
    let lock = lock_path(&settings.path);
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .mode(0o600)
        .custom_flags(OFlag::O_NOFOLLOW.bits())
        .open(&lock)
        .map_err(|e| fs_err::log_open_failed(lock.display().to_string(), e.to_string()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Ok(RotationCheck::LockBusy);
    }

    // The previous holder may have unlinked the file between our open and our
    // lock; a lock on an orphaned inode excludes nobody.
    if !still_linked(&lock, &lock_file) {
        let _ = lock_file.unlock();
        return Ok(RotationCheck::LockBusy);
    }

    let outcome = rotate_locked(settings);

    let _ = fs::remove_file(&lock);
    let _ = lock_file.unlock();
    outcome
}

fn still_linked(path: &Path, file: &File) -> bool {
    match (fs::symlink_metadata(path), file.metadata()) {
        (Ok(on_disk), Ok(held)) => on_disk.dev() == held.dev() && on_disk.ino() == held.ino(),
        _ => false,
    }
}

fn rotate_locked(settings: &LogSettings) -> Result<RotationCheck> {
    let path = &settings.path;
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RotationCheck::NotNeeded),
        Err(e) => return Err(fs_err::log_open_failed(path.display().to_string(), e.to_string())),
    };
    if meta.file_type().is_symlink() {
        return Err(fs_err::log_symlink(path.display().to_string()));
    }
    if meta.len() <= settings.max_bytes {
        return Ok(RotationCheck::NotNeeded);
    }

    shift_generations(path, settings.keep)?;
    fs::rename(path, rotated_path(path, 1))
        .map_err(|e| fs_err::write_failed(path.display().to_string(), e.to_string()))?;
    create_fresh(path)?;
    Ok(RotationCheck::Rotated)
}

/// Move the run of existing generations `.1`, `.2`, ... one up, dropping
/// generation `keep` when the run reaches it
fn shift_generations(path: &Path, keep: usize) -> Result<()> {
    let existing = (1..=keep)
        .take_while(|generation| fs::symlink_metadata(rotated_path(path, *generation)).is_ok())
        .count();

    let highest = if existing == keep {
        let oldest = rotated_path(path, keep);
        match fs::remove_file(&oldest) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(fs_err::write_failed(oldest.display().to_string(), e.to_string())),
        }
        keep - 1
    } else {
        existing
    };

    for generation in (1..=highest).rev() {
        let from = rotated_path(path, generation);
        let to = rotated_path(path, generation + 1);
        match fs::rename(&from, &to) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(fs_err::write_failed(from.display().to_string(), e.to_string())),
        }
    }
    Ok(())
}

fn create_fresh(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .custom_flags(OFlag::O_NOFOLLOW.bits())
        .open(path)
        .map(drop)
        .map_err(|e| fs_err::log_open_failed(path.display().to_string(), e.to_string()))
}
