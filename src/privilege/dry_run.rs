//! Broker wrapper that replaces every mutating command with a logged no-op

use super::{Broker, CommandOutput, Identity, display_argv};
use crate::error::Result;

/// Forwards queries to `inner`, simulates everything else
#[derive(Debug, Clone)]
pub struct DryRunBroker<B> {
    inner: B,
}

impl<B: Broker> DryRunBroker<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    fn simulate(who: &str, argv: &[&str]) -> CommandOutput {
        tracing::info!(target_user = who, "[DRY RUN] would run: {}", display_argv(argv));
        CommandOutput::ok()
    }
}

impl<B: Broker> Broker for DryRunBroker<B> {
    fn run(&self, argv: &[&str]) -> Result<CommandOutput> {
        Ok(Self::simulate("root", argv))
    }

    fn run_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(Self::simulate(&identity.username, argv))
    }

    fn run_as_with_session(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        Ok(Self::simulate(&identity.username, argv))
    }

    fn query(&self, argv: &[&str]) -> Result<CommandOutput> {
        self.inner.query(argv)
    }

    fn query_as(&self, identity: &Identity, argv: &[&str]) -> Result<CommandOutput> {
        self.inner.query_as(identity, argv)
    }

    fn query_as_with_session(
        &self,
        identity: &Identity,
        argv: &[&str],
    ) -> Result<CommandOutput> {
        self.inner.query_as_with_session(identity, argv)
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::SystemBroker;
    use std::path::PathBuf;

    #[test]
    fn test_mutations_are_simulated() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("touched");
        let marker_arg = marker.display().to_string();

        let broker = DryRunBroker::new(SystemBroker::new());
        let out = broker.run(&["touch", &marker_arg]).unwrap();
        assert!(out.success());
        assert!(!marker.exists());
        assert!(broker.is_dry_run());
    }

    #[test]
    fn test_queries_pass_through() {
        let broker = DryRunBroker::new(SystemBroker::with_paths(
            0,
            PathBuf::from("/run/user"),
            None,
        ));
        let out = broker.query(&["sh", "-c", "echo probe"]).unwrap();
        assert_eq!(out.stdout.trim(), "probe");
    }
}
