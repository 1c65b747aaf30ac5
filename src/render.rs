//! Console output for the assistant.
//!
//! This module provides a trait-based rendering abstraction so the session
//! can write to a terminal in production and to an in-memory buffer in tests.

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex};

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for dim text (used for informational notes).
const ANSI_DIM: &str = "\x1b[2m";

/// Printed after every turn that produced a response.
pub const SEPARATOR: &str = "\n\n";

/// Trait for rendering session output.
pub trait Renderer: Send {
    /// Print a chunk of response text exactly as received.
    ///
    /// This is called incrementally as fragments are streamed, so it must not
    /// add whitespace of its own.
    fn print_text(&mut self, text: &str);

    /// Print a complete line of ordinary output.
    fn print_line(&mut self, line: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Called when a turn is complete.
    fn print_separator(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        let _ = write!(self.stdout, "{text}");
        self.flush();
    }

    fn print_line(&mut self, line: &str) {
        let _ = writeln!(self.stdout, "{line}");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            let _ = writeln!(self.stdout, "{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            let _ = writeln!(self.stdout, "{info}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.flush();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_separator(&mut self) {
        let _ = write!(self.stdout, "{SEPARATOR}");
        self.flush();
    }
}

/// Renderer that appends everything to a shared string.
///
/// Errors are recorded as `Error: ...` lines in the same buffer.
#[derive(Clone, Default)]
pub struct BufferRenderer {
    output: Arc<Mutex<String>>,
}

impl BufferRenderer {
    /// Creates an empty buffer renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything rendered so far.
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, String> {
        self.output.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Renderer for BufferRenderer {
    fn print_text(&mut self, text: &str) {
        self.lock().push_str(text);
    }

    fn print_line(&mut self, line: &str) {
        let mut output = self.lock();
        output.push_str(line);
        output.push('\n');
    }

    fn print_info(&mut self, info: &str) {
        self.print_line(info);
    }

    fn print_error(&mut self, error: &str) {
        self.print_line(&format!("Error: {error}"));
    }

    fn print_separator(&mut self) {
        self.lock().push_str(SEPARATOR);
    }
}
