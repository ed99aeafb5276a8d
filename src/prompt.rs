//! The boundary through which questions are shown and answers obtained.
//!
//! [`Terminal`] talks to a human over any `BufRead`/`Write` pair (stdin/stdout
//! in the binary). [`Scripted`] replays a fixed list of answers and records
//! every prompt it was shown; tests and the replay command drive forms with it.
use std::collections::VecDeque;
use std::io::{BufRead, Stdin, Stdout, Write};

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::error::PromptError;
use crate::form::convert::parse_bool;

/// A raw answer: some text (possibly empty) or an explicit null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Answer {
    Text(String),
    Null,
}

pub trait PromptPort {
    fn ask_text(&mut self, prompt: &str) -> Result<Answer, PromptError>;

    fn ask_confirm(&mut self, prompt: &str) -> Result<bool, PromptError>;

    /// Informational message, e.g. a generated id.
    fn notice(&mut self, _message: &str) {}

    /// Shown before a rejected answer is asked for again.
    fn error(&mut self, _message: &str) {}
}

// ————————————————————————————————————————————————————————————————————————————
// TERMINAL
// ————————————————————————————————————————————————————————————————————————————

/// Line-oriented terminal prompts. End of input is the explicit-null signal.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl Terminal<std::io::StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = std::io::stdin();
        Self::new(stdin.lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn show(&mut self, text: &str) -> Result<(), PromptError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> PromptPort for Terminal<R, W> {
    fn ask_text(&mut self, prompt: &str) -> Result<Answer, PromptError> {
        writeln!(self.output, "{}", "-------------".dimmed())?;
        self.show(prompt)?;
        match self.read_line()? {
            Some(line) => Ok(Answer::Text(line)),
            None => {
                // keep the next prompt off the null answer's line
                writeln!(self.output)?;
                Ok(Answer::Null)
            }
        }
    }

    fn ask_confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        let prompt = format!("{} (Y/N) ", prompt.trim_end());
        loop {
            self.show(&prompt)?;
            let Some(line) = self.read_line()? else {
                return Err(PromptError::Interrupted);
            };
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    fn notice(&mut self, message: &str) {
        // display failures are not worth aborting the fill over
        let _ = writeln!(self.output, "{}", message.green());
    }

    fn error(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message.red());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCRIPTED
// ————————————————————————————————————————————————————————————————————————————

/// Answers questions from a fixed script.
///
/// Confirmations consume one scripted answer parsed as yes/no; unparseable
/// answers are skipped the way a terminal would re-ask. A null answer to a
/// confirmation behaves like an interrupted terminal.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<Answer>,
    prompts: Vec<String>,
    notices: Vec<String>,
    errors: Vec<String>,
}

impl Scripted {
    pub fn new<I, A>(answers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Answer>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Every prompt shown so far, questions and confirmations alike.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> Result<Answer, PromptError> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::ScriptExhausted { prompt: prompt.to_string() })
    }
}

impl PromptPort for Scripted {
    fn ask_text(&mut self, prompt: &str) -> Result<Answer, PromptError> {
        self.next(prompt)
    }

    fn ask_confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        loop {
            match self.next(prompt)? {
                Answer::Null => return Err(PromptError::Interrupted),
                Answer::Text(raw) => match parse_bool(&raw) {
                    Ok(yes) => return Ok(yes),
                    Err(_) => continue,
                },
            }
        }
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<Option<String>> for Answer {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(text) => Answer::Text(text),
            None => Answer::Null,
        }
    }
}

impl From<Answer> for Option<String> {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Text(text) => Some(text),
            Answer::Null => None,
        }
    }
}

impl From<&str> for Answer {
    fn from(text: &str) -> Self {
        Answer::Text(text.to_string())
    }
}

impl From<String> for Answer {
    fn from(text: String) -> Self {
        Answer::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn terminal_reads_lines_and_end_of_input() {
        colored::control::set_override(false);
        let mut term = terminal("hello\r\n\n");
        assert_eq!(term.ask_text("a: ").unwrap(), Answer::from("hello"));
        assert_eq!(term.ask_text("b: ").unwrap(), Answer::from(""));
        assert_eq!(term.ask_text("c: ").unwrap(), Answer::Null);
        let shown = String::from_utf8(term.output).unwrap();
        assert_eq!(shown, "-------------\na: -------------\nb: -------------\nc: \n");
    }

    #[test]
    fn terminal_confirm_reasks_until_yes_or_no() {
        let mut term = terminal("maybe\nYes\n");
        assert!(term.ask_confirm("Go on?").unwrap());
        let shown = String::from_utf8(term.output).unwrap();
        assert_eq!(shown, "Go on? (Y/N) Go on? (Y/N) ");
        assert!(matches!(terminal("").ask_confirm("Go on?"), Err(PromptError::Interrupted)));
    }

    #[test]
    fn scripted_records_prompts() {
        let mut port = Scripted::new([Answer::from("x"), Answer::from("later"), Answer::from("no")]);
        assert_eq!(port.ask_text("q1: ").unwrap(), Answer::from("x"));
        assert!(!port.ask_confirm("sure?").unwrap());
        assert_eq!(port.prompts(), ["q1: ", "sure?", "sure?"]);
        assert!(matches!(port.ask_text("q2: "), Err(PromptError::ScriptExhausted { .. })));
    }

    #[test]
    fn answers_deserialize_from_strings_and_nulls() {
        let answers: Vec<Answer> = serde_json::from_str(r#"["a", null, ""]"#).unwrap();
        assert_eq!(answers, vec![Answer::from("a"), Answer::Null, Answer::from("")]);
    }
}
