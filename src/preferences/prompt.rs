//! Interactive questions asked while resolving preferences
//!
//! Invalid answers are rejected by the prompt and asked again; they are
//! never coerced into a default.

use inquire::{Confirm, Select};

use crate::error::Result;

/// Source of answers for fields nobody overrode
pub trait Prompter {
    /// Pick one of `options`, returning its index
    fn select(&mut self, question: &str, options: &[String], default: usize) -> Result<usize>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;
}

/// Terminal prompter backed by `inquire`
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn select(&mut self, question: &str, options: &[String], default: usize) -> Result<usize> {
        let answer = Select::new(question, options.to_vec())
            .with_starting_cursor(default)
            .with_page_size(10)
            .without_filtering()
            .with_help_message("↑↓ to move, ENTER to select")
            .raw_prompt()?;
        Ok(answer.index)
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = Confirm::new(question)
            .with_default(default)
            .with_help_message("Answer y or n")
            .with_error_message("Please type 'y' or 'n'")
            .prompt()?;
        Ok(answer)
    }
}

/// Scripted prompter for tests: answers are consumed in order
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    pub selections: std::collections::VecDeque<usize>,
    pub confirmations: std::collections::VecDeque<bool>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn select(&mut self, question: &str, _options: &[String], default: usize) -> Result<usize> {
        self.asked.push(question.to_string());
        Ok(self.selections.pop_front().unwrap_or(default))
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.confirmations.pop_front().unwrap_or(default))
    }
}
