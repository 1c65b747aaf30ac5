//! The interactive session.
//!
//! [`Session`] owns the current model and drives the read, dispatch, respond
//! cycle.  Exactly one action is outstanding at a time: a new line is read
//! only once the previous answer or shell command has fully completed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::ChatProvider;
use crate::commands::{Action, DEFAULT_MODEL, Dispatcher, model_menu, select_model};
use crate::config::AssistantConfig;
use crate::context::ContextStore;
use crate::error::Result;
use crate::input::{LineReader, ReadOutcome};
use crate::issues::{SystemOpener, UrlOpener, report_issue};
use crate::observability::SESSION_TURNS;
use crate::profile::{Profile, ProfileStore, greeting, local_hour};
use crate::render::Renderer;
use crate::response::{Answer, ResponseLogger, StreamingResponder};
use crate::shell::ShellExecutor;
use crate::shutdown::Shutdown;
use crate::types::Model;

/// Prompt shown for each turn.
pub const PROMPT: &str = "> ";

/// Prompt shown when `/bash` asks for the command to run.
pub const SHELL_PROMPT: &str = "$ ";

/// Printed when the session ends.
pub const GOODBYE: &str = "Goodbye!";

/// The `/version` line.
pub fn version_line() -> String {
    format!("CLI AI Assistant v{}", env!("CARGO_PKG_VERSION"))
}

/// Where the session is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line.
    AwaitingInput,
    /// Classifying a line.
    Dispatching,
    /// Waiting on an answer or a shell command.
    Responding,
    /// Done; no further input is read.
    Exiting,
}

/// One interactive session.
pub struct Session<P: ChatProvider> {
    model: Model,
    state: SessionState,
    dispatcher: Dispatcher,
    responder: StreamingResponder<P>,
    shell: ShellExecutor,
    profile: Option<Profile>,
    renderer: Box<dyn Renderer>,
    opener: Box<dyn UrlOpener>,
    shutdown: Shutdown,
    last_answer: Option<Answer>,
}

impl<P: ChatProvider> Session<P> {
    /// Creates a session using the data directory and options in `config`.
    ///
    /// An unreadable profile is logged and treated as absent.
    pub fn new(provider: P, config: &AssistantConfig, renderer: Box<dyn Renderer>) -> Self {
        let store = ContextStore::new(&config.data_dir);
        let profile = match ProfileStore::new(&config.data_dir).load() {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "could not read profile");
                None
            }
        };
        Self {
            model: config.model.clone(),
            state: SessionState::AwaitingInput,
            dispatcher: Dispatcher::new(config.shell_enabled),
            responder: StreamingResponder::new(provider, store.clone()),
            shell: ShellExecutor::new(store),
            profile,
            renderer,
            opener: Box::new(SystemOpener),
            shutdown: Shutdown::new(),
            last_answer: None,
        }
    }

    /// Replaces the URL opener used by `/error-report`.
    pub fn with_opener(mut self, opener: Box<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Shares `shutdown` with the session so a raised flag ends the loop.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Replaces the log collaborator for answers.
    pub fn with_logger(self, logger: Arc<dyn ResponseLogger>) -> Self {
        Self {
            responder: self.responder.with_logger(logger),
            ..self
        }
    }

    /// Overrides the profile read from the data directory.
    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = profile;
        self
    }

    /// The model queries are sent to.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Changes the model used for subsequent queries.
    pub fn set_model(&mut self, model: Model) {
        info!(model = %model, "model changed");
        self.model = model;
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The most recent answer, if any query has been made.
    pub fn last_answer(&self) -> Option<&Answer> {
        self.last_answer.as_ref()
    }

    /// Prints the greeting for the given local hour.
    pub fn greet(&mut self, hour: u8) {
        for line in greeting(self.profile.as_ref(), hour) {
            self.renderer.print_line(&line);
        }
    }

    /// Greets the user and runs until exit, end of input, or shutdown.
    ///
    /// Only a failure to read input is returned; everything else is reported
    /// on the console and the loop continues.
    pub async fn run(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        self.greet(local_hour());
        self.state = SessionState::AwaitingInput;
        while self.state != SessionState::Exiting {
            if self.shutdown.is_requested() {
                self.state = SessionState::Exiting;
                break;
            }
            match reader.read_line(PROMPT)? {
                ReadOutcome::Line(line) => self.turn(&line, reader).await?,
                ReadOutcome::Interrupted | ReadOutcome::Eof => self.exit(),
            }
        }
        info!("session ended");
        Ok(())
    }

    /// Handles one line of input.
    ///
    /// `reader` supplies the follow-up line for `/model-selection` and
    /// `/bash`.
    pub async fn turn(&mut self, line: &str, reader: &mut dyn LineReader) -> Result<()> {
        self.state = SessionState::Dispatching;
        let action = self.dispatcher.dispatch(line);
        if action != Action::Blank {
            SESSION_TURNS.click();
            debug!(?action, "dispatching");
        }
        match action {
            Action::Blank => {}
            Action::Help => {
                for line in self.dispatcher.help_text().lines() {
                    self.renderer.print_line(line);
                }
            }
            Action::Exit => {
                self.exit();
                return Ok(());
            }
            Action::Version => self.renderer.print_line(&version_line()),
            Action::ReportIssue => {
                for line in report_issue(self.opener.as_ref()) {
                    self.renderer.print_line(&line);
                }
            }
            Action::SelectModel => self.select_model(reader)?,
            Action::RunShell => self.run_shell(reader).await?,
            Action::Query(prompt) => self.query(&prompt).await,
        }
        self.state = SessionState::AwaitingInput;
        Ok(())
    }

    fn exit(&mut self) {
        self.renderer.print_line(GOODBYE);
        self.state = SessionState::Exiting;
    }

    fn select_model(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        self.renderer.print_line("Select a model:");
        for line in model_menu() {
            self.renderer.print_line(&line);
        }
        let ReadOutcome::Line(answer) = reader.read_line(PROMPT)? else {
            return Ok(());
        };
        match select_model(&answer) {
            Ok(model) => {
                self.renderer.print_line(&format!("Model set to {model}."));
                self.set_model(model);
            }
            Err(model) => {
                self.renderer
                    .print_line(&format!("Invalid selection. Defaulting to {DEFAULT_MODEL}."));
                self.set_model(model);
            }
        }
        Ok(())
    }

    async fn run_shell(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        let ReadOutcome::Line(command) = reader.read_line(SHELL_PROMPT)? else {
            return Ok(());
        };
        let command = command.trim();
        if command.is_empty() {
            return Ok(());
        }

        self.state = SessionState::Responding;
        let run = self.shell.run(command).await;
        let text = run.outcome.captured_text();
        if run.outcome.is_success() {
            if !text.is_empty() {
                self.renderer.print_line(text);
            }
        } else {
            self.renderer.print_error(text);
        }
        if let Some(err) = &run.context_error {
            self.renderer
                .print_info(&format!("The command output could not be saved: {err}"));
        }
        self.renderer.print_separator();
        Ok(())
    }

    async fn query(&mut self, prompt: &str) {
        self.state = SessionState::Responding;
        let answer = self
            .responder
            .respond(prompt, &self.model, self.renderer.as_mut(), |_| {})
            .await;
        if let Some(kind) = answer.failure {
            debug!(?kind, "query answered with a failure message");
        }
        self.renderer.print_separator();
        self.last_answer = Some(answer);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::stream;

    use super::*;
    use crate::client::ChunkStream;
    use crate::error::Error;
    use crate::input::ScriptedReader;
    use crate::render::BufferRenderer;
    use crate::types::{ChatCompletionChunk, ChatCompletionRequest, KnownModel};

    /// Provider that answers each request with the next scripted reply.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<Vec<Result<ChatCompletionChunk>>>>>,
        requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    }

    impl ScriptedProvider {
        fn reply(self, fragments: &[&str]) -> Self {
            let chunks = fragments
                .iter()
                .map(|text| Ok(ChatCompletionChunk::text(*text)))
                .collect();
            self.replies.lock().unwrap().push_back(Ok(chunks));
            self
        }

        fn fail(self, err: Error) -> Self {
            self.replies.lock().unwrap().push_back(Err(err));
            self
        }
    }

    #[async_trait::async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))?;
            Ok(Box::pin(stream::iter(reply)))
        }
    }

    struct NoBrowser;

    impl UrlOpener for NoBrowser {
        fn open(&self, _url: &str) -> Result<()> {
            Err(Error::unknown("no browser"))
        }
    }

    fn session(
        provider: ScriptedProvider,
        config: &AssistantConfig,
    ) -> (Session<ScriptedProvider>, BufferRenderer) {
        let renderer = BufferRenderer::new();
        let session = Session::new(provider, config, Box::new(renderer.clone()))
            .with_opener(Box::new(NoBrowser))
            .with_profile(None);
        (session, renderer)
    }

    fn config(dir: &tempfile::TempDir) -> AssistantConfig {
        AssistantConfig::new().with_data_dir(dir.path())
    }

    #[tokio::test]
    async fn exit_prints_goodbye_and_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(["/exit", "never read"]);

        session.run(&mut reader).await.unwrap();

        assert_eq!(session.state(), SessionState::Exiting);
        assert_eq!(reader.remaining(), 1);
        assert!(output.contents().ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn end_of_input_exits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.run(&mut reader).await.unwrap();

        assert_eq!(session.state(), SessionState::Exiting);
        assert!(output.contents().contains("Welcome to the CLI AI Assistant!"));
        assert!(output.contents().ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn interrupt_at_prompt_exits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());
        reader.push(ReadOutcome::Interrupted);
        reader.push(ReadOutcome::Line("never read".to_string()));

        session.run(&mut reader).await.unwrap();

        assert_eq!(reader.remaining(), 1);
        assert!(output.contents().ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn raised_shutdown_flag_ends_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = Shutdown::new();
        let (session, _output) = session(ScriptedProvider::default(), &config(&dir));
        let mut session = session.with_shutdown(shutdown.clone());
        let mut reader = ScriptedReader::new(["hello"]);

        shutdown.request();
        session.run(&mut reader).await.unwrap();

        assert_eq!(session.state(), SessionState::Exiting);
        assert!(reader.prompts().is_empty());
    }

    #[tokio::test]
    async fn query_streams_answer_then_separator() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default().reply(&["Hel", "lo", "!"]);
        let requests = provider.requests.clone();
        let (mut session, output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("say hello", &mut reader).await.unwrap();

        assert_eq!(output.contents(), "Hello!\n\n");
        assert_eq!(session.last_answer().unwrap().text, "Hello!");
        assert_eq!(session.state(), SessionState::AwaitingInput);
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, Model::Known(KnownModel::Gpt35Turbo));
        assert_eq!(requests[0].messages[1].content, "say hello");
    }

    #[tokio::test]
    async fn unknown_slash_word_is_sent_as_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default().reply(&["ok"]);
        let requests = provider.requests.clone();
        let (mut session, _output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("/quit", &mut reader).await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].messages[1].content, "/quit");
        assert_eq!(session.state(), SessionState::AwaitingInput);
    }

    #[tokio::test]
    async fn blank_line_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default();
        let requests = provider.requests.clone();
        let (mut session, output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("   ", &mut reader).await.unwrap();

        assert!(output.contents().is_empty());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_becomes_answer_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default()
            .fail(Error::authentication("bad key"))
            .reply(&["second"]);
        let (mut session, output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(["first", "again", "/exit"]);

        session.run(&mut reader).await.unwrap();

        let contents = output.contents();
        assert!(contents.contains("Error occurred while fetching the response."));
        assert!(contents.contains("OPENAI_API_KEY"));
        assert!(contents.contains("/error-report"));
        assert!(contents.contains("second\n\n"));
        assert_eq!(reader.remaining(), 0);
    }

    #[tokio::test]
    async fn model_selection_sets_chosen_model() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(["2"]);

        session.turn("/model-selection", &mut reader).await.unwrap();

        assert_eq!(session.model(), &Model::Known(KnownModel::Gpt4Turbo));
        assert_eq!(
            output.contents(),
            "Select a model:\n1. gpt-4\n2. gpt-4-turbo\n3. gpt-3.5-turbo\nModel set to gpt-4-turbo.\n"
        );
    }

    #[tokio::test]
    async fn invalid_model_selection_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir).with_model(Model::Known(KnownModel::Gpt4));
        let (mut session, output) = session(ScriptedProvider::default(), &config);

        for answer in ["9", "abc"] {
            session.set_model(Model::Known(KnownModel::Gpt4));
            let mut reader = ScriptedReader::new([answer]);
            session.turn("/model-selection", &mut reader).await.unwrap();
            assert_eq!(session.model(), &Model::Known(KnownModel::Gpt35Turbo));
        }
        assert!(
            output
                .contents()
                .contains("Invalid selection. Defaulting to gpt-3.5-turbo.")
        );
    }

    #[tokio::test]
    async fn selected_model_is_used_for_next_query() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default().reply(&["hi"]);
        let requests = provider.requests.clone();
        let (mut session, _output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(["/model-selection", "1", "hello", "/exit"]);

        session.run(&mut reader).await.unwrap();

        assert_eq!(
            requests.lock().unwrap()[0].model,
            Model::Known(KnownModel::Gpt4)
        );
    }

    #[tokio::test]
    async fn version_and_help() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("/version", &mut reader).await.unwrap();
        session.turn("/help", &mut reader).await.unwrap();

        let contents = output.contents();
        assert!(contents.starts_with(&format!("CLI AI Assistant v{}\n", env!("CARGO_PKG_VERSION"))));
        assert!(contents.contains("/model-selection"));
        assert!(contents.contains("/bash"));
    }

    #[tokio::test]
    async fn error_report_falls_back_to_url() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("/error-report", &mut reader).await.unwrap();

        assert!(output.contents().contains(
            "Please visit: https://github.com/Benedek553/cli-ai-assistant/issues"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_output_becomes_context_for_next_query() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default().reply(&["a text file"]);
        let requests = provider.requests.clone();
        let (mut session, output) = session(provider, &config(&dir));
        let mut reader = ScriptedReader::new(["/bash", "echo a.txt", "what did that list?", "/exit"]);

        session.run(&mut reader).await.unwrap();

        assert!(output.contents().contains("a.txt\n\n"));
        assert_eq!(reader.prompts(), vec!["> ", "$ ", "> ", "> "]);
        let requests = requests.lock().unwrap();
        let prompt = &requests[0].messages[1].content;
        assert!(prompt.starts_with("what did that list?"));
        assert!(prompt.contains("echo a.txt"));
        assert!(prompt.contains("Output: a.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_shell_command_is_reported_and_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(["exit 4"]);

        session.turn("/bash", &mut reader).await.unwrap();

        assert!(output.contents().contains("Error: Command failed (exit code 4)"));
        let record = ContextStore::new(dir.path()).load().unwrap().unwrap();
        assert_eq!(record.command, "exit 4");
        assert_eq!(session.state(), SessionState::AwaitingInput);
    }

    #[tokio::test]
    async fn empty_shell_command_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut reader = ScriptedReader::new(["  "]);

        session.turn("/bash", &mut reader).await.unwrap();

        assert!(output.contents().is_empty());
        assert_eq!(ContextStore::new(dir.path()).load().unwrap(), None);
    }

    #[tokio::test]
    async fn bash_is_a_prompt_when_shell_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::default().reply(&["no shell here"]);
        let requests = provider.requests.clone();
        let (mut session, _output) = session(provider, &config(&dir).without_shell());
        let mut reader = ScriptedReader::new(Vec::<String>::new());

        session.turn("/bash", &mut reader).await.unwrap();

        assert!(reader.prompts().is_empty());
        assert_eq!(requests.lock().unwrap()[0].messages[1].content, "/bash");
    }

    #[test]
    fn greeting_uses_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (session, output) = session(ScriptedProvider::default(), &config(&dir));
        let mut session = session.with_profile(Some(Profile {
            username: "Ada".to_string(),
        }));

        session.greet(19);

        assert_eq!(
            output.contents(),
            "Good evening, Ada!\nHow can I assist you today, Ada?\n"
        );
    }
}
