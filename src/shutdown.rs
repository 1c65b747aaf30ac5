//! Process-wide termination handling.
//!
//! A signal ends the process at once, abandoning whatever the session is
//! waiting on.  The flag lets the session notice a request that arrived
//! between reads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Shared shutdown flag and the signal hook that sets it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    /// Creates a flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Raises the flag.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Installs the SIGINT/SIGTERM handler.
    ///
    /// The handler raises the flag, says goodbye, and exits with status 0.
    /// `ctrlc` does not report which signal arrived, so SIGTERM also prints
    /// the goodbye line.  Only one handler may be installed per process.
    pub fn install(&self) -> Result<()> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || {
            shutdown.request();
            tracing::info!("termination signal received, exiting");
            println!("\nGoodbye!");
            std::process::exit(0);
        })
        .map_err(|err| Error::unknown(format!("failed to install signal handler: {err}")))
    }
}
