//! User input and interaction handling.
//! The context builder only needs to ask for a value with a default, so the
//! terminal sits behind the [`Prompter`] trait.

use crate::error::{Error, Result};
use dialoguer::{Confirm, Input};

pub trait Prompter {
    /// Asks for a free-text value. Empty input yields `default`.
    fn read_variable(&self, name: &str, default: &str) -> Result<String>;

    /// Shows `options` as a 1-based numbered list and returns the raw answer.
    /// Empty input yields `"1"`.
    fn read_choice(&self, name: &str, options: &[String]) -> Result<String>;

    /// Asks a yes/no question.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Terminal prompter backed by dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn read_variable(&self, name: &str, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(name)
            .default(default.to_string())
            .interact_text()
            .map_err(|e| Error::PromptError(e.to_string()))
    }

    fn read_choice(&self, name: &str, options: &[String]) -> Result<String> {
        Input::<String>::new()
            .with_prompt(choice_prompt(name, options))
            .default("1".to_string())
            .interact_text()
            .map_err(|e| Error::PromptError(e.to_string()))
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .map_err(|e| Error::PromptError(e.to_string()))
    }
}

/// Formats the numbered choice list shown to the user.
pub fn choice_prompt(name: &str, options: &[String]) -> String {
    let lines: Vec<String> =
        options.iter().enumerate().map(|(i, option)| format!("{} - {}", i + 1, option)).collect();
    let numbers: Vec<String> = (1..=options.len()).map(|i| i.to_string()).collect();
    format!("Select {}:\n{}\nChoose from {}", name, lines.join("\n"), numbers.join(", "))
}

/// Maps a 1-based answer to an option, or `None` if it is not a valid index.
pub fn parse_choice<'a>(answer: &str, options: &'a [String]) -> Option<&'a String> {
    let index: usize = answer.trim().parse().ok()?;
    index.checked_sub(1).and_then(|i| options.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["MIT".to_string(), "BSD".to_string(), "GPL".to_string()]
    }

    #[test]
    fn test_choice_prompt() {
        assert_eq!(
            choice_prompt("license", &options()),
            "Select license:\n1 - MIT\n2 - BSD\n3 - GPL\nChoose from 1, 2, 3"
        );
    }

    #[test]
    fn test_parse_choice() {
        let options = options();
        assert_eq!(parse_choice("1", &options).map(String::as_str), Some("MIT"));
        assert_eq!(parse_choice(" 3 ", &options).map(String::as_str), Some("GPL"));
        assert_eq!(parse_choice("0", &options), None);
        assert_eq!(parse_choice("4", &options), None);
        assert_eq!(parse_choice("BSD", &options), None);
        assert_eq!(parse_choice("-1", &options), None);
    }
}
