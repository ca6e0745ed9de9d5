//! Backed-up, roll-back-on-failure file edits
//!
//! Every configuration file change goes through [`SafeEditor::edit`]: the
//! file is copied into the private temporary area first, the edit function
//! runs, and if it reports failure or panics the copy is put back so the
//! file ends up byte-identical to before. The copy is staged next to the
//! original and renamed over it, so a restore is never seen half-written.
//!
//! ## Usage
//!
//! ```ignore
//! let editor = SafeEditor::new(false)?;
//! let outcome = editor.edit(Path::new("/etc/default/grub"), |path| {
//!     keyfile::apply_assignments(path, &[("GRUB_TIMEOUT", "0")])
//! })?;
//! ```
//!
//! A concurrent editor of the same file outside this process is not guarded
//! against.

pub mod keyfile;

use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tempfile::{TempDir, TempPath};

use crate::error::{Result, fs as fs_err};

/// Result of a successful (or simulated) edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Changed,
    Unchanged,
    /// Dry-run: nothing was touched
    Simulated,
}

/// What a restore has to put back besides the bytes
#[derive(Debug)]
struct Saved {
    copy: TempPath,
    permissions: fs::Permissions,
    uid: u32,
    gid: u32,
}

/// Copy of a file taken before an edit, owned for the duration of that edit
#[derive(Debug)]
struct Backup {
    original: PathBuf,
    /// `None` when the file did not exist before the edit
    saved: Option<Saved>,
}

impl Backup {
    fn take(original: &Path, area: &Path) -> Result<Self> {
        let meta = match fs::metadata(original) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    original: original.to_path_buf(),
                    saved: None,
                });
            }
            Err(e) => {
                return Err(fs_err::backup_failed(original.display().to_string(), e.to_string()));
            }
        };

        let file_name = original
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());
        let backup = tempfile::Builder::new()
            .prefix(&format!("{file_name}."))
            .suffix(".bak")
            .tempfile_in(area)
            .map_err(|e| fs_err::backup_failed(original.display().to_string(), e.to_string()))?
            .into_temp_path();

        // fs::copy carries the source mode over; backups are owner-only regardless
        fs::copy(original, &backup)
            .and_then(|_| fs::set_permissions(&backup, fs::Permissions::from_mode(0o600)))
            .map_err(|e| fs_err::backup_failed(original.display().to_string(), e.to_string()))?;

        tracing::debug!(
            original = %original.display(),
            backup = %backup.display(),
            "backup taken"
        );
        Ok(Self {
            original: original.to_path_buf(),
            saved: Some(Saved {
                copy: backup,
                permissions: meta.permissions(),
                uid: meta.uid(),
                gid: meta.gid(),
            }),
        })
    }

    fn restore(&self) -> Result<()> {
        let target = self.original.display().to_string();
        match &self.saved {
            Some(saved) => self
                .replace_with(saved)
                .map_err(|e| fs_err::restore_failed(&target, e.to_string())),
            None => match fs::remove_file(&self.original) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(fs_err::restore_failed(&target, e.to_string())),
            },
        }
    }

    /// Stage the saved copy beside the original, then rename it into place
    fn replace_with(&self, saved: &Saved) -> io::Result<()> {
        let dir = self
            .original
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = tempfile::Builder::new()
            .prefix(".deskset-restore.")
            .tempfile_in(dir)?;
        io::copy(&mut File::open(&saved.copy)?, staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        std::os::unix::fs::chown(staged.path(), Some(saved.uid), Some(saved.gid))?;
        fs::set_permissions(staged.path(), saved.permissions.clone())?;
        staged.persist(&self.original).map_err(|e| e.error)?;
        Ok(())
    }

    /// Leave the copy in the temporary area; it goes when the area is dropped
    fn retire(self) {
        if let Some(saved) = self.saved {
            let _ = saved.copy.keep();
        }
    }
}

/// Restores its backup when dropped unless committed, so an edit function
/// that panics still leaves the original in place
#[derive(Debug)]
struct RollbackGuard(Option<Backup>);

impl RollbackGuard {
    fn commit(mut self) {
        if let Some(backup) = self.0.take() {
            backup.retire();
        }
    }

    fn roll_back(mut self) -> Result<()> {
        match self.0.take() {
            Some(backup) => {
                let restored = backup.restore();
                backup.retire();
                restored
            }
            None => Ok(()),
        }
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if let Some(backup) = self.0.take() {
            tracing::warn!(path = %backup.original.display(), "edit abandoned, restoring backup");
            if let Err(e) = backup.restore() {
                tracing::error!(error = %e, "restore after abandoned edit failed");
            }
            backup.retire();
        }
    }
}

/// Applies edit functions with backup and rollback
#[derive(Debug)]
pub struct SafeEditor {
    area: TempDir,
    dry_run: bool,
}

impl SafeEditor {
    /// Create an editor with its own private temporary area
    pub fn new(dry_run: bool) -> Result<Self> {
        Ok(Self {
            area: crate::temp::private_area()?,
            dry_run,
        })
    }

    /// Directory backups are written to
    pub fn area(&self) -> &Path {
        self.area.path()
    }

    /// Run `edit` against `path`, restoring the previous contents if it fails.
    ///
    /// The edit function returns whether it changed anything and must be safe
    /// to apply repeatedly.
    pub fn edit<F>(&self, path: &Path, edit: F) -> Result<EditOutcome>
    where
        F: FnOnce(&Path) -> Result<bool>,
    {
        if self.dry_run {
            tracing::info!(path = %path.display(), "[DRY RUN] would edit file");
            return Ok(EditOutcome::Simulated);
        }

        let guard = RollbackGuard(Some(Backup::take(path, self.area())?));
        match edit(path) {
            Ok(changed) => {
                guard.commit();
                Ok(if changed {
                    EditOutcome::Changed
                } else {
                    EditOutcome::Unchanged
                })
            }
            Err(edit_error) => {
                tracing::warn!(path = %path.display(), error = %edit_error, "edit failed, restoring backup");
                guard.roll_back()?;
                Err(edit_error)
            }
        }
    }
}
