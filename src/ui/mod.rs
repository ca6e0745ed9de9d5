//! Step progress presentation
//!
//! All progress reporting goes through the [`ProgressReporter`] trait so the
//! pipeline does not care whether a spinner is drawn (interactive terminal)
//! or nothing is (piped output, tests).

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for the step pipeline
pub trait ProgressReporter {
    /// Announce the step about to run (1-based position)
    fn start_step(&mut self, name: &str, current: usize, total: usize);

    /// Mark the current step done
    fn finish_step(&mut self);

    /// Run `f` with the progress display hidden, so it can print freely
    fn suspend(&self, f: &mut dyn FnMut());

    /// All steps ran
    fn finish(&mut self);

    /// Stop early, leaving the last state visible
    fn abandon(&mut self);
}

/// Progress bar across the pipeline's steps
pub struct InteractiveProgressReporter {
    step_pb: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new(total_steps: u64) -> Self {
        let step_pb = ProgressBar::new(total_steps);
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:30.cyan/blue}] {pos}/{len} {msg}") {
            step_pb.set_style(style.progress_chars("#>-"));
        }
        Self { step_pb }
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start_step(&mut self, name: &str, current: usize, total: usize) {
        self.step_pb.set_message(format!("({current}/{total}) {name}"));
    }

    fn finish_step(&mut self) {
        self.step_pb.inc(1);
    }

    fn suspend(&self, f: &mut dyn FnMut()) {
        self.step_pb.suspend(f);
    }

    fn finish(&mut self) {
        self.step_pb.finish_and_clear();
    }

    fn abandon(&mut self) {
        self.step_pb.abandon();
    }
}

/// No-op reporter for non-terminal output and tests
#[derive(Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_step(&mut self, _name: &str, _current: usize, _total: usize) {}

    fn finish_step(&mut self) {}

    fn suspend(&self, f: &mut dyn FnMut()) {
        f();
    }

    fn finish(&mut self) {}

    fn abandon(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_progress_reporter_runs_suspended_closure() {
        let mut reporter = SilentProgressReporter;
        reporter.start_step("system-packages", 1, 7);
        let mut called = false;
        reporter.suspend(&mut || called = true);
        reporter.finish_step();
        reporter.finish();
        assert!(called);
    }

    #[test]
    fn test_interactive_progress_reporter_counts_steps() {
        let mut reporter = InteractiveProgressReporter::new(7);
        reporter.start_step("system-packages", 1, 7);
        reporter.finish_step();
        reporter.start_step("flathub-remote", 2, 7);
        reporter.finish_step();
        assert_eq!(reporter.step_pb.position(), 2);
        reporter.abandon();
    }
}
