//! Host precondition errors

use super::DesksetError;

/// Creates an unsupported host error
pub fn unsupported(id: impl Into<String>) -> DesksetError {
    DesksetError::UnsupportedHost { id: id.into() }
}

/// Creates an unreadable os-release error
pub fn os_release_unreadable(path: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::OsReleaseUnreadable {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a missing tool error
pub fn missing_tool(tool: impl Into<String>) -> DesksetError {
    DesksetError::MissingTool { tool: tool.into() }
}
