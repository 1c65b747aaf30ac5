//! The application log.
//!
//! Events go to `<data_dir>/app.log`, one line each, appended across runs.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Environment variable holding the log filter, e.g. `debug` or
/// `cli_ai_assistant=trace`.
pub const LOG_FILTER_ENV: &str = "CLI_AI_ASSISTANT_LOG";

/// Filter used when [`LOG_FILTER_ENV`] is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Opens `path` for appending, creating it and its directory if needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| Error::io("failed to create log directory", err))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))
}

/// Installs the global subscriber writing to the log file at `path`.
pub fn init(path: &Path) -> Result<()> {
    let file = open_log_file(path)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| Error::unknown(format!("failed to install logger: {err}")))
}

/// Printed when the process ends because of an unexpected fault.
pub const CRITICAL_ERROR: &str = "A critical error occurred. Exiting...";

/// Exit status for an unexpected fault.
pub const FAULT_EXIT_CODE: i32 = 1;

/// Treats any panic as fatal.
///
/// The panic is logged and reported by the default hook, then the process
/// exits with [`FAULT_EXIT_CODE`] instead of unwinding.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_default();
        tracing::error!(%message, %location, "unexpected fault");
        default_hook(info);
        eprintln!("{CRITICAL_ERROR}");
        std::process::exit(FAULT_EXIT_CODE);
    }));
}
