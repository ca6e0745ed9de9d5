//! Command, prompt and signal errors

use super::DesksetError;

/// Creates a spawn failure for an external program
pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> DesksetError {
    DesksetError::CommandSpawnFailed {
        program: program.into(),
        reason: reason.into(),
    }
}

pub fn signal_handler_failed(reason: impl Into<String>) -> DesksetError {
    DesksetError::SignalHandlerFailed {
        reason: reason.into(),
    }
}

/// Creates an interruption error; `during` reads like "during step 'x'"
pub fn interrupted(during: impl Into<String>) -> DesksetError {
    DesksetError::Interrupted {
        during: during.into(),
    }
}
