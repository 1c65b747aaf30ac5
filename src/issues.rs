//! Opening the issue tracker for `/error-report`.

use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Where bugs are reported.
pub const ISSUES_URL: &str = "https://github.com/Benedek553/cli-ai-assistant/issues";

/// Opens URLs for the user.
pub trait UrlOpener: Send + Sync {
    /// Opens `url`, typically in a browser.
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        let status = opener_command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| Error::io("failed to launch browser", err))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::unknown(format!("browser launcher exited with {status}")))
        }
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// Opens the issue tracker and returns the lines to show the user.
pub fn report_issue(opener: &dyn UrlOpener) -> Vec<String> {
    match opener.open(ISSUES_URL) {
        Ok(()) => vec!["Opened GitHub issues page in your default browser.".to_string()],
        Err(err) => {
            tracing::warn!(error = %err, "could not open issues page");
            vec![
                format!("Error opening GitHub issues: {err}"),
                format!("Please visit: {ISSUES_URL}"),
            ]
        }
    }
}
