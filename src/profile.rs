//! The user profile written at setup time and the greeting built from it.

use std::fs;
use std::io;
use std::path::PathBuf;

use time::OffsetDateTime;

use crate::error::{Error, Result};

/// File holding the username.
pub const USER_FILE: &str = "user.txt";

/// Who is using the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The name to greet the user by.
    pub username: String,
}

/// Reads and writes the [`Profile`] inside the data directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the username file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(USER_FILE)
    }

    /// Loads the profile.  A missing or blank username file yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<Profile>> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(text) => {
                let username = text.trim();
                if username.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Profile {
                        username: username.to_string(),
                    }))
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io(
                format!("failed to read {}", path.display()),
                err,
            )),
        }
    }

    /// Writes the username, creating the data directory if needed.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| Error::io("failed to create data directory", err))?;
        fs::write(self.path(), format!("{}\n", profile.username.trim()))
            .map_err(|err| Error::io("failed to write username", err))
    }
}

/// The two greeting lines shown when a session starts.
///
/// `hour` is the local hour of day (0-23).
pub fn greeting(profile: Option<&Profile>, hour: u8) -> [String; 2] {
    match profile {
        Some(profile) => {
            let name = &profile.username;
            let part_of_day = if hour < 12 {
                "morning"
            } else if hour < 18 {
                "afternoon"
            } else {
                "evening"
            };
            [
                format!("Good {part_of_day}, {name}!"),
                format!("How can I assist you today, {name}?"),
            ]
        }
        None => [
            "Welcome to the CLI AI Assistant!".to_string(),
            "Type /help to see available commands.".to_string(),
        ],
    }
}

/// The current local hour, falling back to UTC when the local offset cannot
/// be determined.
pub fn local_hour() -> u8 {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .hour()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Profile {
        Profile {
            username: "Ada".to_string(),
        }
    }

    #[test]
    fn greeting_by_time_of_day() {
        assert_eq!(greeting(Some(&ada()), 8)[0], "Good morning, Ada!");
        assert_eq!(greeting(Some(&ada()), 12)[0], "Good afternoon, Ada!");
        assert_eq!(greeting(Some(&ada()), 17)[0], "Good afternoon, Ada!");
        assert_eq!(greeting(Some(&ada()), 18)[0], "Good evening, Ada!");
        assert_eq!(
            greeting(Some(&ada()), 23)[1],
            "How can I assist you today, Ada?"
        );
    }

    #[test]
    fn generic_greeting_without_profile() {
        let lines = greeting(None, 9);
        assert_eq!(lines[0], "Welcome to the CLI AI Assistant!");
        assert_eq!(lines[1], "Type /help to see available commands.");
    }

    #[test]
    fn missing_profile_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("data"));

        store.save(&ada()).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "Ada\n");
        assert_eq!(store.load().unwrap(), Some(ada()));
    }

    #[test]
    fn blank_username_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn local_hour_in_range() {
        assert!(local_hour() < 24);
    }
}
