//! Command implementations for the deskset CLI

pub mod completions;
pub mod run;
pub mod version;
