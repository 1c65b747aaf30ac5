//! Interactive command-line assistant.
//!
//! This binary reads questions at a `> ` prompt and streams answers from an
//! OpenAI-compatible chat completions endpoint.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="your_api_key_here"
//!
//! # Basic usage with default settings
//! cli-ai-assistant
//!
//! # Start with a specific model
//! cli-ai-assistant --model gpt-4
//!
//! # Disable the /bash command and colors
//! cli-ai-assistant --no-shell --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/model-selection` - Choose a model from a menu
//! - `/bash` - Run a shell command; its output is shared with the next question
//! - `/version` - Show the version
//! - `/error-report` - Open the issue tracker
//! - `/exit` - Exit the application

use std::env;
use std::process::ExitCode;

use arrrg::CommandLine;
use tracing::{error, info};

use cli_ai_assistant::client::{API_KEY_ENV, BASE_URL_ENV};
use cli_ai_assistant::logging;
use cli_ai_assistant::{
    AssistantArgs, AssistantConfig, EditorReader, OpenAi, PlainTextRenderer, Session, Shutdown,
};

/// Main entry point for the cli-ai-assistant application.
#[tokio::main]
async fn main() -> ExitCode {
    let (args, _) = AssistantArgs::from_command_line_relaxed("cli-ai-assistant [OPTIONS]");
    let config = AssistantConfig::from(args);

    if let Err(err) = logging::init(&config.log_path()) {
        eprintln!("Warning: logging disabled: {err}");
    }
    logging::install_panic_hook();

    let base_url = config
        .base_url
        .clone()
        .or_else(|| env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty()));
    let client = match OpenAi::with_options(None, base_url, None) {
        Ok(client) => client,
        Err(err) if err.is_configuration() => {
            error!(error = %err, "missing credential");
            eprintln!("Error: {API_KEY_ENV} environment variable is not set.");
            eprintln!("Please set it using: export {API_KEY_ENV}=\"your_api_key_here\"");
            return ExitCode::from(1);
        }
        Err(err) => {
            error!(error = %err, "could not create client");
            eprintln!("Error: {err}");
            return ExitCode::from(1);
        }
    };

    let shutdown = Shutdown::new();
    if let Err(err) = shutdown.install() {
        error!(error = %err, "could not install signal handler");
    }

    let mut reader = match EditorReader::new() {
        Ok(reader) => reader,
        Err(err) => {
            error!(error = %err, "could not open terminal");
            eprintln!("Error: {err}");
            return ExitCode::from(1);
        }
    };

    info!(model = %config.model, base_url = client.base_url(), "session starting");
    let renderer = PlainTextRenderer::with_color(config.use_color);
    let mut session = Session::new(client, &config, Box::new(renderer)).with_shutdown(shutdown);

    match session.run(&mut reader).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "unexpected fault");
            eprintln!("Error: {err}");
            ExitCode::from(1)
        }
    }
}
