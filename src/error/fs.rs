//! File system errors

use super::DesksetError;

/// Creates a log symlink refusal
pub fn log_symlink(path: impl Into<String>) -> DesksetError {
    DesksetError::LogIsSymlink { path: path.into() }
}

/// Creates a log open failure
pub fn log_open_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::LogOpenFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a temporary area failure
pub fn temp_area_failed(reason: impl Into<String>) -> DesksetError {
    DesksetError::TempAreaFailed {
        reason: reason.into(),
    }
}

pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::FileReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::FileWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn backup_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::BackupFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn restore_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::RestoreFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an edit failure, reported by an edit function
pub fn edit_failed(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::EditFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> DesksetError {
    DesksetError::IoError {
        message: message.into(),
    }
}
