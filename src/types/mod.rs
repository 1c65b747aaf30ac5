// Public modules
pub mod api_error_object;
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod chat_message;
pub mod model;

// Re-exports
pub use api_error_object::{ApiErrorObject, ErrorResponse};
pub use chat_completion_chunk::{ChatCompletionChunk, ChoiceDelta, ChunkChoice};
pub use chat_completion_request::ChatCompletionRequest;
pub use chat_message::{ChatMessage, ChatRole};
pub use model::{KnownModel, Model};
