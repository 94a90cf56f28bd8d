//! Per-property confirmation during import

use console::{Term, style};
use std::collections::VecDeque;
use std::io;

use cairn_core::SchemaNode;

/// Decides whether a discovered property is merged into the manifest
pub trait Confirm {
    fn confirm(&mut self, name: &str, schema: &SchemaNode) -> io::Result<bool>;
}

/// Interactive terminal prompt; an empty answer means yes
pub struct ConsoleConfirm {
    term: Term,
}

impl ConsoleConfirm {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for ConsoleConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for ConsoleConfirm {
    fn confirm(&mut self, name: &str, schema: &SchemaNode) -> io::Result<bool> {
        let type_name = schema.type_name().unwrap_or("any");

        loop {
            self.term.write_str(&format!(
                "{} Add parameter {} ({})? [Y/n] ",
                style("?").yellow(),
                style(name).cyan(),
                type_name
            ))?;

            match parse_answer(&self.term.read_line()?) {
                Some(answer) => return Ok(answer),
                None => self.term.write_line("  Please answer y or n.")?,
            }
        }
    }
}

fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _name: &str, _schema: &SchemaNode) -> io::Result<bool> {
        Ok(true)
    }
}

/// Replays fixed answers, then accepts; records what was asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, name: &str, _schema: &SchemaNode) -> io::Result<bool> {
        self.asked.push(name.to_string());
        Ok(self.answers.pop_front().unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("\n"), Some(true));
        assert_eq!(parse_answer("Y"), Some(true));
        assert_eq!(parse_answer("yes"), Some(true));
        assert_eq!(parse_answer(" no "), Some(false));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[test]
    fn test_scripted() {
        let mut confirm = ScriptedConfirm::new([false]);
        let schema = SchemaNode::empty_object();

        assert!(!confirm.confirm("a", &schema).unwrap());
        assert!(confirm.confirm("b", &schema).unwrap());
        assert_eq!(confirm.asked(), ["a", "b"]);
    }
}
