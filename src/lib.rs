// Public modules
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod issues;
pub mod logging;
pub mod observability;
pub mod profile;
pub mod render;
pub mod response;
pub mod session;
pub mod shell;
pub mod shutdown;
pub mod sse;
pub mod types;

// Re-exports
pub use client::{ChatProvider, ChunkStream, OpenAi};
pub use commands::{Action, Dispatcher};
pub use config::{AssistantArgs, AssistantConfig};
pub use context::{ContextRecord, ContextStore};
pub use error::{Error, FailureKind, Result};
pub use input::{EditorReader, LineReader, ReadOutcome, ScriptedReader};
pub use issues::{SystemOpener, UrlOpener};
pub use observability::register_biometrics;
pub use profile::{Profile, ProfileStore};
pub use render::{BufferRenderer, PlainTextRenderer, Renderer};
pub use response::{Answer, Fragment, ResponseLogger, StreamingResponder, TracingResponseLogger};
pub use session::{Session, SessionState};
pub use shell::{ShellExecutor, ShellOutcome, ShellRun};
pub use shutdown::Shutdown;
pub use types::*;
