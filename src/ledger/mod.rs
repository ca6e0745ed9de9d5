//! Outcome ledger for one run
//!
//! Three append-only sequences (changed, skipped, failed). Recording prints a
//! one-line notice immediately; the summary is rendered from whatever has
//! accumulated when it is asked for, so it is equally valid at the end of a
//! clean run and from the abnormal-exit path.

use std::fmt;

use console::Style;

use crate::logging::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Changed,
    Skipped,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Changed => "changed",
            Status::Skipped => "skipped",
            Status::Failed => "failed",
        })
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    changed: Vec<String>,
    skipped: Vec<String>,
    failed: Vec<String>,
    quiet: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that records without printing notices
    #[cfg(test)]
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// Append an entry and announce it
    pub fn record(&mut self, status: Status, message: impl Into<String>) {
        let message = message.into();
        if status == Status::Failed {
            tracing::error!(status = %status, "{message}");
        } else {
            tracing::info!(status = %status, "{message}");
        }
        if !self.quiet {
            println!("{}", notice(status, &message));
        }
        match status {
            Status::Changed => self.changed.push(message),
            Status::Skipped => self.skipped.push(message),
            Status::Failed => self.failed.push(message),
        }
    }

    pub fn changed(&self) -> &[String] {
        &self.changed
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.changed.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summary with one section per non-empty sequence, in fixed order
    pub fn render_summary(&self) -> String {
        let sections = [
            ("Changed", Style::new().green().bold(), &self.changed),
            ("Skipped", Style::new().dim().bold(), &self.skipped),
            ("Failed", Style::new().red().bold(), &self.failed),
        ];
        let mut out = String::new();
        for (label, style, items) in sections {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("{} ({})\n", style.apply_to(label), items.len()));
            for item in items {
                out.push_str(&format!("  - {item}\n"));
            }
        }
        out
    }

    /// Print whatever has accumulated so far
    pub fn summarize(&self) {
        if self.is_empty() {
            return;
        }
        println!();
        print!("{}", self.render_summary());
    }

    /// Differs only in whether anything failed; never affects the exit code
    pub fn final_message(&self) -> String {
        match self.failed.len() {
            0 => "Completed.".to_string(),
            n => format!("Completed with {n} failure(s)."),
        }
    }

    pub fn session_status(&self) -> SessionStatus {
        match self.failed.len() {
            0 => SessionStatus::Completed,
            failures => SessionStatus::CompletedWithFailures { failures },
        }
    }
}

fn notice(status: Status, message: &str) -> String {
    let (mark, style) = match status {
        Status::Changed => ("✓", Style::new().green()),
        Status::Skipped => ("-", Style::new().dim()),
        Status::Failed => ("✗", Style::new().red()),
    };
    format!("  {} {}", style.apply_to(mark), message)
}
