//! Private temporary area for backups, never created under the current
//! working directory (e.g. when TMPDIR=tmp or TMPDIR=./tmp).

use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::{Result, fs as fs_err};

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        PathBuf::from("/tmp")
    }
}

/// Create the per-process private area (mode 0700), removed when dropped
pub fn private_area() -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix("deskset-")
        .tempdir_in(temp_dir_base())
        .map_err(|e| fs_err::temp_area_failed(e.to_string()))?;
    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700))
        .map_err(|e| fs_err::temp_area_failed(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_area_is_owner_only() {
        let area = private_area().unwrap();
        let mode = fs::metadata(area.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
        assert!(area.path().is_absolute());
        let path = area.path().to_path_buf();
        drop(area);
        assert!(!path.exists());
    }
}
