//! Configuration types for the assistant.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the session runs with.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::commands::DEFAULT_MODEL;
use crate::types::Model;

/// Name of the per-user data directory inside the home directory.
pub const DATA_DIR_NAME: &str = ".cli-ai-assistant";

/// Name of the application log inside the data directory.
pub const LOG_FILE: &str = "app.log";

/// Command-line arguments for the cli-ai-assistant tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct AssistantArgs {
    /// Model to start with.
    #[arrrg(optional, "Model to use (default: gpt-3.5-turbo)", "MODEL")]
    pub model: Option<String>,

    /// Where context, profile, and log files are kept.
    #[arrrg(optional, "Data directory (default: ~/.cli-ai-assistant)", "DIR")]
    pub data_dir: Option<String>,

    /// Provider endpoint override.
    #[arrrg(optional, "API base URL (default: $OPENAI_BASE_URL or OpenAI)", "URL")]
    pub base_url: Option<String>,

    /// Disable the /bash command.
    #[arrrg(flag, "Disable the /bash command")]
    pub no_shell: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for an assistant session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// The model the session starts with.
    pub model: Model,

    /// Directory holding the persisted files.
    pub data_dir: PathBuf,

    /// Provider endpoint; `None` uses the environment or the default.
    pub base_url: Option<String>,

    /// Whether `/bash` is available.
    pub shell_enabled: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl AssistantConfig {
    /// Creates a new AssistantConfig with default values.
    ///
    /// Defaults:
    /// - Model: gpt-3.5-turbo
    /// - Data directory: `~/.cli-ai-assistant`
    /// - Shell: enabled
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::Known(DEFAULT_MODEL),
            data_dir: default_data_dir(),
            base_url: None,
            shell_enabled: true,
            use_color: true,
        }
    }

    /// Sets the starting model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the provider base URL.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Disables the `/bash` command.
    pub fn without_shell(mut self) -> Self {
        self.shell_enabled = false;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Path of the application log.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<AssistantArgs> for AssistantConfig {
    fn from(args: AssistantArgs) -> Self {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or(Model::Known(DEFAULT_MODEL));
        let data_dir = args
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        AssistantConfig {
            model,
            data_dir,
            base_url: args.base_url,
            shell_enabled: !args.no_shell,
            use_color: !args.no_color,
        }
    }
}

/// `~/.cli-ai-assistant`, or `./.cli-ai-assistant` when there is no home.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = AssistantConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gpt35Turbo));
        assert!(config.data_dir.ends_with(DATA_DIR_NAME));
        assert!(config.base_url.is_none());
        assert!(config.shell_enabled);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = AssistantConfig::from(AssistantArgs::default());
        assert_eq!(config, AssistantConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = AssistantArgs {
            model: Some("gpt-4".to_string()),
            data_dir: Some("/tmp/assistant".to_string()),
            base_url: Some("http://localhost:8080/v1".to_string()),
            no_shell: true,
            no_color: true,
        };
        let config = AssistantConfig::from(args);
        assert_eq!(config.model, Model::Known(KnownModel::Gpt4));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/assistant"));
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert!(!config.shell_enabled);
        assert!(!config.use_color);
        assert_eq!(config.log_path(), PathBuf::from("/tmp/assistant/app.log"));
    }

    #[test]
    fn unknown_model_is_kept_verbatim() {
        let args = AssistantArgs {
            model: Some("gpt-4o-mini".to_string()),
            ..AssistantArgs::default()
        };
        let config = AssistantConfig::from(args);
        assert_eq!(config.model, Model::Custom("gpt-4o-mini".to_string()));
    }

    #[test]
    fn config_builder_pattern() {
        let config = AssistantConfig::new()
            .with_model(Model::Known(KnownModel::Gpt4Turbo))
            .with_data_dir("data")
            .with_base_url(Some("http://example.test/".to_string()))
            .without_shell()
            .without_color();

        assert_eq!(config.model, Model::Known(KnownModel::Gpt4Turbo));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.base_url.as_deref(), Some("http://example.test/"));
        assert!(!config.shell_enabled);
        assert!(!config.use_color);
    }
}
