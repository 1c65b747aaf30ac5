//! Persistence of the last shell command and its output.
//!
//! The store holds at most one [`ContextRecord`].  Saving a record replaces the
//! previous one entirely; nothing older than the most recent command is kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File holding the last command.
pub const COMMAND_FILE: &str = "command.txt";
/// File holding the captured output of the last command.
pub const OUTPUT_FILE: &str = "command_output.txt";

/// The last shell command the user ran and what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRecord {
    /// The command line as typed.
    pub command: String,
    /// The captured output, or the failure message if it did not succeed.
    pub output: String,
}

impl ContextRecord {
    /// Creates a new record.
    pub fn new(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }
}

/// Reads and writes the [`ContextRecord`] inside the data directory.
#[derive(Debug, Clone)]
pub struct ContextStore {
    dir: PathBuf,
}

impl ContextStore {
    /// Creates a store rooted at `dir`.  The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the last-command file.
    pub fn command_path(&self) -> PathBuf {
        self.dir.join(COMMAND_FILE)
    }

    /// Path of the last-output file.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    /// Loads the stored record.
    ///
    /// Returns `Ok(None)` when either file is missing or when the command or
    /// the output is empty once trimmed.
    pub fn load(&self) -> Result<Option<ContextRecord>> {
        let Some(command) = read_trimmed(&self.command_path())? else {
            return Ok(None);
        };
        let Some(output) = read_trimmed(&self.output_path())? else {
            return Ok(None);
        };
        if command.is_empty() || output.is_empty() {
            return Ok(None);
        }
        Ok(Some(ContextRecord { command, output }))
    }

    /// Replaces the stored record with `record`.
    ///
    /// The old command is removed first, then the output and the command are
    /// written, each through a temporary file and a rename.  A save that fails
    /// partway leaves no record rather than a mix of two commands.
    pub fn save(&self, record: &ContextRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| Error::io("failed to create data directory", err))?;
        remove_if_present(&self.command_path())?;
        write_replace(&self.output_path(), &record.output)?;
        write_replace(&self.command_path(), &record.command)?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::io(
            format!("failed to remove {}", path.display()),
            err,
        )),
    }
}

fn read_trimmed(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(
            format!("failed to read {}", path.display()),
            err,
        )),
    }
}

fn write_replace(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, contents)
        .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
    fs::rename(&tmp, path)
        .map_err(|err| Error::io(format!("failed to replace {}", path.display()), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());

        store.save(&ContextRecord::new("ls", "a.txt\n")).unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(ContextRecord::new("ls", "a.txt"))
        );
    }

    #[test]
    fn second_save_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());

        store
            .save(&ContextRecord::new("ls -la", "total 0\nfoo\nbar"))
            .unwrap();
        store.save(&ContextRecord::new("pwd", "/tmp")).unwrap();

        assert_eq!(
            store.load().unwrap(),
            Some(ContextRecord::new("pwd", "/tmp"))
        );
        assert_eq!(fs::read_to_string(store.output_path()).unwrap(), "/tmp");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("nested").join("data"));

        store.save(&ContextRecord::new("echo hi", "hi")).unwrap();
        assert!(store.command_path().exists());
    }

    #[test]
    fn empty_output_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());

        store.save(&ContextRecord::new("true", "")).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn missing_output_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());

        fs::write(store.command_path(), "ls").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn failed_save_never_mixes_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path());
        store.save(&ContextRecord::new("C1", "out1")).unwrap();

        // The command cannot be staged, so only the output write succeeds.
        fs::create_dir(store.command_path().with_extension("txt.tmp")).unwrap();
        assert!(store.save(&ContextRecord::new("C2", "out2")).is_err());

        assert_eq!(store.load().unwrap(), None);
    }
}
