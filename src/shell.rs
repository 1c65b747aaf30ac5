//! Running a single shell command and remembering what it printed.
//!
//! [`ShellExecutor::run`] never fails outward.  Every outcome, including a
//! command that cannot be spawned, is turned into captured text that is stored
//! as the new [`ContextRecord`] and handed back for display.

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::context::{ContextRecord, ContextStore};
use crate::error::Error;
use crate::observability::{SHELL_DURATION, SHELL_FAILURES, SHELL_RUNS};

/// How a shell command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    /// Exit code 0.
    Succeeded {
        /// Standard output, or standard error when nothing went to stdout.
        output: String,
    },
    /// The command ran but exited non-zero, or was killed by a signal.
    Failed {
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// The failure message.
        message: String,
    },
    /// The shell itself could not be started.
    SpawnFailed {
        /// The failure message.
        message: String,
    },
}

impl ShellOutcome {
    /// The single text blob kept for context and shown to the user.
    pub fn captured_text(&self) -> &str {
        match self {
            ShellOutcome::Succeeded { output } => output,
            ShellOutcome::Failed { message, .. } => message,
            ShellOutcome::SpawnFailed { message } => message,
        }
    }

    /// Returns true if the command exited with status 0.
    pub fn is_success(&self) -> bool {
        matches!(self, ShellOutcome::Succeeded { .. })
    }

    /// The outcome as an error, if it was not a success.
    pub fn as_error(&self) -> Option<Error> {
        match self {
            ShellOutcome::Succeeded { .. } => None,
            ShellOutcome::Failed { exit_code, message } => {
                Some(Error::shell_execution(message.clone(), *exit_code))
            }
            ShellOutcome::SpawnFailed { message } => {
                Some(Error::shell_execution(message.clone(), None))
            }
        }
    }
}

/// The result of [`ShellExecutor::run`].
#[derive(Debug, Clone)]
pub struct ShellRun {
    /// How the command ended.
    pub outcome: ShellOutcome,
    /// Set if the outcome could not be persisted as context.
    pub context_error: Option<Error>,
}

/// Runs shell commands and records the last one in the [`ContextStore`].
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    store: ContextStore,
}

impl ShellExecutor {
    /// Creates an executor that records into `store`.
    pub fn new(store: ContextStore) -> Self {
        Self { store }
    }

    /// The store outcomes are recorded into.
    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Runs `command` to completion and overwrites the stored context with it.
    pub async fn run(&self, command: &str) -> ShellRun {
        SHELL_RUNS.click();
        debug!(command, "executing shell command");
        let start = Instant::now();

        let outcome = execute(command).await;
        SHELL_DURATION.add(start.elapsed().as_secs_f64());
        if let Some(err) = outcome.as_error() {
            SHELL_FAILURES.click();
            warn!(command, error = %err, "shell command failed");
        }

        let record = ContextRecord::new(command, outcome.captured_text());
        let context_error = match self.store.save(&record) {
            Ok(()) => None,
            Err(err) => {
                error!(command, error = %err, "failed to save command context");
                Some(err)
            }
        };

        ShellRun {
            outcome,
            context_error,
        }
    }
}

async fn execute(command: &str) -> ShellOutcome {
    let output = shell_command(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            return ShellOutcome::SpawnFailed {
                message: format!("Failed to run command: {err}"),
            };
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

    if output.status.success() {
        let output = if stdout.is_empty() { stderr } else { stdout };
        return ShellOutcome::Succeeded { output };
    }

    let exit_code = output.status.code();
    let detail = if stderr.is_empty() { stdout } else { stderr };
    let status = match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    let message = if detail.is_empty() {
        format!("Command failed ({status})")
    } else {
        format!("Command failed ({status}): {detail}")
    };
    ShellOutcome::Failed { exit_code, message }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
