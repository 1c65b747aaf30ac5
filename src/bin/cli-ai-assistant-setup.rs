//! First-run setup for cli-ai-assistant.
//!
//! Creates the data directory and records the name used in the greeting.
//!
//! # Usage
//!
//! ```bash
//! cli-ai-assistant-setup
//!
//! # Keep data somewhere other than ~/.cli-ai-assistant
//! cli-ai-assistant-setup --data-dir /tmp/assistant
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use cli_ai_assistant::config::default_data_dir;
use cli_ai_assistant::{EditorReader, LineReader, Profile, ProfileStore, ReadOutcome};

/// Command-line arguments for the cli-ai-assistant-setup tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    /// Where to create the data directory.
    #[arrrg(optional, "Data directory (default: ~/.cli-ai-assistant)", "DIR")]
    data_dir: Option<String>,
}

fn main() -> ExitCode {
    let (args, _) = Args::from_command_line_relaxed("cli-ai-assistant-setup [OPTIONS]");
    let data_dir = args
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(default_data_dir);

    match setup(data_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Setup failed: {err}");
            ExitCode::from(1)
        }
    }
}

fn setup(data_dir: PathBuf) -> cli_ai_assistant::Result<()> {
    fs::create_dir_all(&data_dir).map_err(|err| {
        cli_ai_assistant::Error::io(format!("failed to create {}", data_dir.display()), err)
    })?;

    let mut reader = EditorReader::new()?;
    let username = match reader.read_line("Please enter your name: ")? {
        ReadOutcome::Line(line) => line.trim().to_string(),
        ReadOutcome::Interrupted | ReadOutcome::Eof => String::new(),
    };

    if username.is_empty() {
        println!("No name given; the assistant will use a generic greeting.");
    } else {
        ProfileStore::new(&data_dir).save(&Profile { username })?;
    }

    println!("Setup complete. Data is stored in {}", data_dir.display());
    println!("Set OPENAI_API_KEY and run `cli-ai-assistant` to start.");
    Ok(())
}
