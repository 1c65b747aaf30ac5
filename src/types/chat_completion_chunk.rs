use serde::{Deserialize, Serialize};

/// One server-sent event of a streaming chat completion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    #[serde(default)]
    pub id: String,

    /// The model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Incremental choices; the assistant only ever asks for one.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A single choice inside a [`ChatCompletionChunk`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The newly generated content.
    #[serde(default)]
    pub delta: ChoiceDelta,

    /// Set on the last chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The content added by one chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoiceDelta {
    /// Role, present on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Newly generated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying a single text delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChoiceDelta {
                    content: Some(content.into()),
                    ..ChoiceDelta::default()
                },
                ..ChunkChoice::default()
            }],
            ..Self::default()
        }
    }

    /// The text fragment carried by the first choice, if it is non-empty.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_chunk_deserialization() {
        let json = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion.chunk",
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}]
        });

        let chunk: ChatCompletionChunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk.id, "chatcmpl-123");
        assert_eq!(chunk.fragment(), Some("Hel"));
    }

    #[test]
    fn role_only_chunk_has_no_fragment() {
        let json = json!({
            "id": "chatcmpl-123",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]
        });

        let chunk: ChatCompletionChunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk.fragment(), None);
    }

    #[test]
    fn final_chunk_has_no_fragment() {
        let json = json!({
            "id": "chatcmpl-123",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        });

        let chunk: ChatCompletionChunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk.fragment(), None);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn empty_choices_have_no_fragment() {
        let chunk = ChatCompletionChunk::default();
        assert_eq!(chunk.fragment(), None);
    }
}
