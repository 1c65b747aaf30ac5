//! Slash command dispatch for the session.
//!
//! A line is a command only if it is exactly one of the registered command
//! strings.  Everything else, including an unregistered `/word`, is a prompt
//! for the model.

use crate::types::{KnownModel, Model};

/// Show the command table.
pub const HELP: &str = "/help";
/// Leave the session.
pub const EXIT: &str = "/exit";
/// Print the version.
pub const VERSION: &str = "/version";
/// Open the issue tracker.
pub const ERROR_REPORT: &str = "/error-report";
/// Choose a model from the menu.
pub const MODEL_SELECTION: &str = "/model-selection";
/// Run a shell command and remember its output.
pub const BASH: &str = "/bash";

/// What a line of input asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Display help information.
    Help,

    /// Exit the session.
    Exit,

    /// Print version information.
    Version,

    /// Open the issue tracker.
    ReportIssue,

    /// Present the model menu.
    SelectModel,

    /// Read a shell command and run it.
    RunShell,

    /// Nothing to do.
    Blank,

    /// Send the text to the model.
    Query(String),
}

/// Classifies input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    shell_enabled: bool,
}

impl Dispatcher {
    /// Creates a dispatcher; `/bash` is registered only when `shell_enabled`.
    pub fn new(shell_enabled: bool) -> Self {
        Self { shell_enabled }
    }

    /// Classifies one raw input line.
    ///
    /// Surrounding whitespace is ignored; matching is exact and
    /// case-sensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cli_ai_assistant::commands::{Action, Dispatcher};
    /// let dispatcher = Dispatcher::new(true);
    /// assert_eq!(dispatcher.dispatch("/exit"), Action::Exit);
    /// assert_eq!(dispatcher.dispatch("/EXIT"), Action::Query("/EXIT".to_string()));
    /// assert_eq!(dispatcher.dispatch("  "), Action::Blank);
    /// ```
    pub fn dispatch(&self, line: &str) -> Action {
        let line = line.trim();
        match line {
            "" => Action::Blank,
            HELP => Action::Help,
            EXIT => Action::Exit,
            VERSION => Action::Version,
            ERROR_REPORT => Action::ReportIssue,
            MODEL_SELECTION => Action::SelectModel,
            BASH if self.shell_enabled => Action::RunShell,
            _ => Action::Query(line.to_string()),
        }
    }

    /// Returns help text describing available commands.
    pub fn help_text(&self) -> String {
        let mut help = String::from("\nAvailable commands:\n");
        help.push_str("  /help             - Show this help message\n");
        help.push_str("  /exit             - Exit the assistant\n");
        help.push_str("  /error-report     - Open GitHub issues page for bug reporting\n");
        help.push_str("  /model-selection  - Select a different AI model\n");
        help.push_str("  /version          - Show version information\n");
        if self.shell_enabled {
            help.push_str(
                "  /bash             - Run a shell command; its output is shared with the next question\n",
            );
        }
        help.push_str("\nJust type your question or request for AI assistance.\n");
        help
    }
}

/// Models offered by `/model-selection`, in menu order.
pub const MODEL_MENU: [KnownModel; 3] = KnownModel::ALL;

/// The model used when a selection is invalid, and at startup.
pub const DEFAULT_MODEL: KnownModel = KnownModel::Gpt35Turbo;

/// The numbered menu lines, starting at 1.
pub fn model_menu() -> Vec<String> {
    MODEL_MENU
        .iter()
        .enumerate()
        .map(|(index, model)| format!("{}. {model}", index + 1))
        .collect()
}

/// Resolves a menu answer.
///
/// Returns the chosen model, or `Err` with [`DEFAULT_MODEL`] when the answer
/// is not a number in range.
pub fn select_model(answer: &str) -> Result<Model, Model> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|choice| choice.checked_sub(1))
        .and_then(|index| MODEL_MENU.get(index))
        .map(|model| Model::Known(*model))
        .ok_or(Model::Known(DEFAULT_MODEL))
}
