//! Reading lines from the user.
//!
//! The session reads through [`LineReader`] so that a terminal editor can be
//! swapped for a scripted reader in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// What a single read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its trailing newline.
    Line(String),
    /// The user pressed Ctrl-C at the prompt.
    Interrupted,
    /// The input is exhausted (Ctrl-D).
    Eof,
}

/// Source of input lines.
pub trait LineReader: Send {
    /// Shows `prompt` and waits for one line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
}

/// Terminal line editor with in-memory history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    /// Creates a reader attached to the terminal.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(readline_error(err)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(err) => Error::io("failed to read input", err),
        err => Error::unknown(format!("input error: {err}")),
    }
}

/// Reader that replays a fixed script, then reports end of input.
///
/// Every prompt shown is recorded and can be inspected through a clone.
#[derive(Clone, Default)]
pub struct ScriptedReader {
    script: Arc<Mutex<VecDeque<ReadOutcome>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedReader {
    /// Creates a reader that returns each of `lines` in order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = lines
            .into_iter()
            .map(|line| ReadOutcome::Line(line.into()))
            .collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            prompts: Arc::default(),
        }
    }

    /// Appends an arbitrary outcome to the script.
    pub fn push(&self, outcome: ReadOutcome) {
        lock(&self.script).push_back(outcome);
    }

    /// The prompts shown so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Number of scripted outcomes not yet read.
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        lock(&self.prompts).push(prompt.to_string());
        Ok(lock(&self.script).pop_front().unwrap_or(ReadOutcome::Eof))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
