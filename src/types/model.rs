use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a chat model identifier.
///
/// This can be one of the models offered in the selection menu or a custom
/// string value for any other model the provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (fine-tunes, newer or private models)
    Custom(String),
}

/// Models offered by the `/model-selection` menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// GPT-4
    #[serde(rename = "gpt-4")]
    Gpt4,

    /// GPT-4 Turbo
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,

    /// GPT-3.5 Turbo
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl KnownModel {
    /// All known models, in menu order.
    pub const ALL: [KnownModel; 3] = [
        KnownModel::Gpt4,
        KnownModel::Gpt4Turbo,
        KnownModel::Gpt35Turbo,
    ];

    /// The wire identifier of this model.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gpt4 => "gpt-4",
            KnownModel::Gpt4Turbo => "gpt-4-turbo",
            KnownModel::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Gpt35Turbo)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{known_model}"),
            Model::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownModel::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<KnownModel>()
            .map(Model::Known)
            .unwrap_or_else(|_| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}
