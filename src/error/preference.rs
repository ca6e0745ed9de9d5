//! Preference validation errors

use super::DesksetError;

/// Creates an invalid preference error listing the allowed values
pub fn invalid<S: AsRef<str>>(
    field: impl Into<String>,
    value: impl Into<String>,
    allowed: &[S],
) -> DesksetError {
    DesksetError::InvalidPreference {
        field: field.into(),
        value: value.into(),
        allowed: allowed
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Creates an invalid log setting error
pub fn invalid_log_setting(
    field: impl Into<String>,
    value: impl Into<String>,
    reason: impl Into<String>,
) -> DesksetError {
    DesksetError::InvalidLogSetting {
        field: field.into(),
        value: value.into(),
        reason: reason.into(),
    }
}
