use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Model};

/// Parameters for a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// The model that will answer.
    pub model: Model,

    /// The conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,

    /// Whether the answer is delivered incrementally as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a new non-streaming request.
    pub fn new(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }

    /// Create a new streaming request.
    pub fn new_streaming(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            stream: true,
        }
    }
}
