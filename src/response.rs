//! Turning one prompt into a streamed answer.
//!
//! [`StreamingResponder::fragments`] is the producer: it opens a single
//! streaming request and yields the answer as [`Fragment`]s, converting any
//! failure into exactly one synthetic fragment and then ending.
//! [`StreamingResponder::respond`] is the consumer the session loop uses: it
//! drives the fragments one at a time, writing each to the console, the
//! accumulated answer, the caller's sink, and the log, in that order.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::client::{ChatProvider, ChunkStream};
use crate::context::{ContextRecord, ContextStore};
use crate::error::{Error, FailureKind};
use crate::observability::{
    CONTEXT_READ_ERRORS, PROVIDER_ERRORS, QUERIES, QUERY_FRAGMENTS, STREAM_DURATION, STREAM_TTFF,
};
use crate::render::Renderer;
use crate::types::{ChatCompletionRequest, ChatMessage, Model};

/// Instructions sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful command line AI assistant. Provide concise and accurate answers to user queries. Please respond in English. If the user asks for code, provide only the code block without any additional text. If you are unsure about the answer, respond with 'I'm not sure about that.'";

/// Closing line of every failure message.
pub const REPORT_HINT: &str =
    "If the problem persists, you can report it with the /error-report command.";

/// Appends the last command and its output to `prompt`, if there is one.
pub fn augment_prompt(prompt: &str, context: Option<&ContextRecord>) -> String {
    match context {
        Some(record) => format!(
            "{prompt}\n\nContext: I previously ran this command: {}\nOutput: {}",
            record.command, record.output
        ),
        None => prompt.to_string(),
    }
}

/// The plain-English text shown in place of an answer when the request fails.
pub fn failure_message(kind: FailureKind, model: &Model) -> String {
    let detail = match kind {
        FailureKind::Credential => "Please check that your OPENAI_API_KEY is valid.".to_string(),
        FailureKind::UnavailableModel => format!(
            "The model \"{model}\" may not be available. Try selecting a different model with /model-selection."
        ),
        FailureKind::Connectivity => "Check your internet connection and API key.".to_string(),
    };
    format!("Error occurred while fetching the response.\n{detail}\n\n{REPORT_HINT}\n")
}

/// One piece of an answer.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Text generated by the model.
    Text(String),
    /// The synthetic fragment that replaces the rest of a failed answer.
    Failure {
        /// The failure category.
        kind: FailureKind,
        /// The error that ended the stream.
        error: Error,
        /// The message shown to the user.
        text: String,
    },
}

impl Fragment {
    fn failure(error: Error, model: &Model) -> Self {
        let kind = FailureKind::classify(&error);
        Fragment::Failure {
            kind,
            text: failure_message(kind, model),
            error,
        }
    }

    /// The text of this fragment, as the user sees it.
    pub fn text(&self) -> &str {
        match self {
            Fragment::Text(text) => text,
            Fragment::Failure { text, .. } => text,
        }
    }
}

/// The complete result of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Every fragment concatenated in arrival order.
    pub text: String,
    /// Number of fragments received.
    pub fragments: usize,
    /// Set when the answer ended in a failure fragment.
    pub failure: Option<FailureKind>,
}

/// Destination for fragment and failure log records.
pub trait ResponseLogger: Send + Sync {
    /// Record one fragment of a model answer.
    fn log_fragment(&self, fragment: &str);

    /// Record a failed request.
    fn log_failure(&self, error: &Error);
}

/// Logs through `tracing`, one event per fragment or failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingResponseLogger;

impl ResponseLogger for TracingResponseLogger {
    fn log_fragment(&self, fragment: &str) {
        info!(target: "cli_ai_assistant::response", "AI Response Chunk: {fragment}");
    }

    fn log_failure(&self, error: &Error) {
        error!(target: "cli_ai_assistant::response", error = %error, "Error fetching AI response");
    }
}

/// Streams answers from a [`ChatProvider`], using the stored command context.
pub struct StreamingResponder<P: ChatProvider> {
    provider: P,
    store: ContextStore,
    logger: Arc<dyn ResponseLogger>,
}

impl<P: ChatProvider> StreamingResponder<P> {
    /// Creates a responder that logs through `tracing`.
    pub fn new(provider: P, store: ContextStore) -> Self {
        Self {
            provider,
            store,
            logger: Arc::new(TracingResponseLogger),
        }
    }

    /// Replaces the log collaborator.
    pub fn with_logger(mut self, logger: Arc<dyn ResponseLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Builds the request for `prompt`, augmented with the stored context.
    ///
    /// A context that cannot be read is logged and left out.
    pub fn build_request(&self, prompt: &str, model: &Model) -> ChatCompletionRequest {
        let context = match self.store.load() {
            Ok(context) => context,
            Err(err) => {
                CONTEXT_READ_ERRORS.click();
                warn!(error = %err, "could not read previous command context");
                None
            }
        };
        ChatCompletionRequest::new_streaming(
            model.clone(),
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(augment_prompt(prompt, context.as_ref())),
            ],
        )
    }

    /// Opens one streaming request and yields its fragments in arrival order.
    ///
    /// Nothing is sent until the stream is first polled.  A failure, whether
    /// while opening the request or mid-stream, produces one
    /// [`Fragment::Failure`] and ends the stream.
    pub fn fragments(&self, prompt: &str, model: &Model) -> impl Stream<Item = Fragment> + '_ {
        let request = self.build_request(prompt, model);
        let state = FragmentState::Opening {
            provider: &self.provider,
            request,
        };

        stream::unfold(state, |state| async move {
            let (mut chunks, model) = match state {
                FragmentState::Opening { provider, request } => {
                    let model = request.model.clone();
                    match provider.stream_chat(request).await {
                        Ok(chunks) => (chunks, model),
                        Err(err) => {
                            let fragment = Fragment::failure(err, &model);
                            return Some((fragment, FragmentState::Finished));
                        }
                    }
                }
                FragmentState::Streaming { chunks, model } => (chunks, model),
                FragmentState::Finished => return None,
            };

            loop {
                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        if let Some(text) = chunk.fragment() {
                            let fragment = Fragment::Text(text.to_string());
                            return Some((fragment, FragmentState::Streaming { chunks, model }));
                        }
                    }
                    Some(Err(err)) => {
                        return Some((Fragment::failure(err, &model), FragmentState::Finished));
                    }
                    None => return None,
                }
            }
        })
    }

    /// Answers `prompt`, streaming every fragment to `renderer`, the returned
    /// [`Answer`], `sink`, and the log, one fragment at a time.
    ///
    /// Never fails: provider errors become a failure fragment.
    pub async fn respond<F>(
        &self,
        prompt: &str,
        model: &Model,
        renderer: &mut dyn Renderer,
        mut sink: F,
    ) -> Answer
    where
        F: FnMut(&str),
    {
        QUERIES.click();
        let start = Instant::now();
        let mut answer = Answer {
            text: String::new(),
            fragments: 0,
            failure: None,
        };

        let fragments = self.fragments(prompt, model);
        futures::pin_mut!(fragments);
        while let Some(fragment) = fragments.next().await {
            if answer.fragments == 0 {
                STREAM_TTFF.add(start.elapsed().as_secs_f64());
            }
            if let Fragment::Failure { kind, error, .. } = &fragment {
                PROVIDER_ERRORS.click();
                self.logger.log_failure(error);
                answer.failure = Some(*kind);
            } else {
                QUERY_FRAGMENTS.click();
            }

            let text = fragment.text();
            renderer.print_text(text);
            answer.text.push_str(text);
            answer.fragments += 1;
            sink(text);
            if let Fragment::Text(text) = &fragment {
                self.logger.log_fragment(text);
            }
        }

        STREAM_DURATION.add(start.elapsed().as_secs_f64());
        answer
    }
}

enum FragmentState<'a, P> {
    Opening {
        provider: &'a P,
        request: ChatCompletionRequest,
    },
    Streaming {
        chunks: ChunkStream,
        model: Model,
    },
    Finished,
}
