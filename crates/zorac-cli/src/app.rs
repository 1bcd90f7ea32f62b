//! Interactive chat loop

use anyhow::Context;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};
use zorac_core::commands::{Input, parse_input, system_prompt_on};
use zorac_core::{
    AppendOutcome, CompactResult, ConfigStore, ContextController, FileSessionStore, LoadOutcome,
    OpenAiCompatClient, Settings, StreamCoordinator, StreamingResult, Summarizer,
    TokenAccountant, ZoracPaths,
};

use crate::args::Cli;
use crate::commands::{self, Flow};
use crate::console::CliConsole;
use crate::history::InputHistory;
use crate::setup;
use crate::signal_handler::{InterruptAction, SignalHandler};
use crate::ui::markdown::FALLBACK_THEME;

type PendingTurn = JoinHandle<StreamingResult>;

/// Everything the loop and the slash commands operate on
pub struct App {
    pub(crate) console: Arc<CliConsole>,
    pub(crate) settings: Settings,
    pub(crate) config: ConfigStore,
    pub(crate) controller: ContextController,
    pub(crate) coordinator: Arc<StreamCoordinator>,
    pub(crate) history: InputHistory,
    pub(crate) online: bool,
}

/// Resolve configuration, restore the session and run the chat loop until exit
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = ZoracPaths::from_env();
    let config = ConfigStore::new(&paths.config_file);
    let bootstrap_console = CliConsole::new(cli.verbose, FALLBACK_THEME);

    if !config.exists() {
        if let Err(e) = setup::run_wizard(&config, &bootstrap_console) {
            bootstrap_console.warn(&format!("{}. Continuing with defaults.", e));
        }
    }

    let file = config.load().unwrap_or_else(|e| {
        bootstrap_console.warn(&format!("Ignoring config file: {}", e));
        BTreeMap::new()
    });
    let settings = Settings::load(&file, &cli.overrides());
    let console = Arc::new(CliConsole::new(cli.verbose, &settings.code_theme));

    let accountant = TokenAccountant::with_fallback(&settings.encoding)
        .context("failed to load a tokenizer")?;
    let client = OpenAiCompatClient::with_timeout(
        &settings.base_url,
        &settings.api_key,
        settings.request_timeout(),
    )
    .context("failed to create the inference client")?;
    let store = Arc::new(FileSessionStore::new(&paths.session_file));

    let (controller, outcome) = ContextController::bootstrap(
        accountant.clone(),
        Summarizer::new(&settings.model),
        store,
        settings.context_settings(),
        Arc::new(system_prompt_on),
    )
    .await;

    let mut app = App {
        console,
        coordinator: Arc::new(StreamCoordinator::new(Arc::new(client), accountant)),
        history: InputHistory::load(&paths.history_file),
        settings,
        config,
        controller,
        online: false,
    };

    app.print_banner(&outcome);
    app.check_connection().await;
    app.run_loop().await
}

impl App {
    fn print_banner(&self, outcome: &LoadOutcome) {
        self.console.print_header("Zorac - Local LLM Chat Client");
        self.console.detail(&format!("Server: {}", self.settings.base_url));
        self.console.detail(&format!("Model:  {}", self.settings.model));

        match outcome {
            LoadOutcome::Restored { messages } => self.console.success(&format!(
                "Loaded previous session ({} messages, ~{} tokens)",
                messages,
                self.controller.token_count()
            )),
            LoadOutcome::Fresh => self.console.info("Starting a new conversation"),
            LoadOutcome::Corrupt(e) | LoadOutcome::Unreadable(e) => self
                .console
                .warn(&format!("Could not load the saved session ({}); starting fresh", e)),
        }
        self.console
            .info("Type /help for commands, Ctrl+C to interrupt a response, Ctrl+D to exit.");
    }

    /// Probe the server. Returns whether it answered.
    pub(crate) async fn check_connection(&mut self) -> bool {
        self.console
            .start_progress(&format!("Connecting to {}...", self.settings.base_url));
        let probe = self.coordinator.client().list_models().await;
        self.console.stop_progress();

        match probe {
            Ok(models) => {
                self.online = true;
                self.console
                    .success(&format!("Connected to {}", self.settings.base_url));
                if !models.is_empty() && !models.iter().any(|m| m == &self.settings.model) {
                    self.console.warn(&format!(
                        "Model {} is not listed by the server (available: {})",
                        self.settings.model,
                        models.join(", ")
                    ));
                }
            }
            Err(e) => {
                self.online = false;
                warn!(code = e.code(), "connection check failed: {}", e);
                self.console.error(&format!("Connection failed: {}", e));
                self.console
                    .info("Local commands still work. Use /reconnect once the server is up.");
            }
        }
        self.online
    }

    async fn run_loop(&mut self) -> anyhow::Result<()> {
        let mut signals = SignalHandler::register().context("failed to register Ctrl+C handler")?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut pending: Option<PendingTurn> = None;

        loop {
            if pending.is_none() {
                self.console.prompt();
            }

            tokio::select! {
                Some(_) = signals.interrupted() => {
                    match InterruptAction::for_state(pending.is_some()) {
                        InterruptAction::CancelResponse => {
                            if self.coordinator.cancel_active() {
                                self.console.status("Response interrupted.");
                            }
                        }
                        InterruptAction::Exit => break,
                    }
                }
                joined = wait_for(&mut pending) => {
                    pending = None;
                    self.finish_turn(joined).await;
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            self.console.error(&format!("Failed to read input: {}", e));
                            break;
                        }
                    };

                    if let Some(running) = pending.take() {
                        debug!("new input supersedes the running response");
                        self.coordinator.cancel_active();
                        self.finish_turn(running.await).await;
                    }

                    match self.handle_line(&line).await {
                        Step::Continue => {}
                        Step::Generate(turn) => pending = Some(turn),
                        Step::Exit => break,
                    }
                }
            }
        }

        if let Some(running) = pending.take() {
            self.coordinator.cancel_active();
            let _ = running.await;
        }
        self.shutdown().await;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Step {
        match parse_input(line) {
            Input::Empty => Step::Continue,
            Input::Command(command) => {
                self.remember(line);
                match commands::dispatch(self, command).await {
                    Flow::Continue => Step::Continue,
                    Flow::Exit => Step::Exit,
                }
            }
            Input::Chat(text) => {
                self.remember(line);
                match self.start_turn(text).await {
                    Some(turn) => Step::Generate(turn),
                    None => Step::Continue,
                }
            }
        }
    }

    fn remember(&mut self, line: &str) {
        self.history.push(line.trim());
        self.history.save();
    }

    /// Append the user message, compact if over budget and spawn the generation
    async fn start_turn(&mut self, text: String) -> Option<PendingTurn> {
        if !self.online && !self.check_connection().await {
            self.console
                .error("Not connected to the server; message not sent.");
            return None;
        }

        if self.controller.refresh_system_message() {
            debug!("calendar date changed, rebuilt system message");
        }
        self.controller.append_user(text);

        let client = self.coordinator.client();
        if self.controller.token_count() > self.controller.settings().max_input_tokens {
            self.console.start_progress("Summarizing conversation history...");
        }
        let compaction = self.controller.check_budget(client.as_ref()).await;
        self.console.stop_progress();
        self.report_compaction(&compaction);

        let generation = self.coordinator.begin();
        let messages = self.controller.snapshot();
        let settings = self.settings.generation_settings();
        let coordinator = Arc::clone(&self.coordinator);
        let console = Arc::clone(&self.console);
        console.set_streaming(settings.stream_enabled);

        Some(tokio::spawn(async move {
            coordinator
                .run_registered(generation, messages, &settings, console.as_ref())
                .await
        }))
    }

    pub(crate) fn report_compaction(&self, result: &CompactResult) {
        if !result.was_compacted {
            return;
        }
        match &result.fallback_error {
            None => self.console.info(&format!(
                "Summarized {} older messages ({} -> {} tokens)",
                result.messages_compacted, result.tokens_before, result.tokens_after
            )),
            Some(e) => self.console.warn(&format!(
                "Summarization failed ({}); dropped {} older messages",
                e, result.messages_compacted
            )),
        }
    }

    async fn finish_turn(&mut self, joined: Result<StreamingResult, JoinError>) {
        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                self.console.error(&format!("Response task failed: {}", e));
                return;
            }
        };

        if let Some(e) = &result.error {
            warn!(code = e.code(), "response failed: {}", e);
            self.console.error(&format!("Error: {}", e));
            if e.is_connection() {
                self.online = false;
            }
        }

        match self.controller.append_assistant(&result).await {
            AppendOutcome::Saved => {}
            AppendOutcome::Unsaved(e) => self
                .console
                .warn(&format!("Response kept in memory but not saved: {}", e)),
            AppendOutcome::Discarded => return,
        }

        let usage = self.controller.token_usage();
        self.console
            .status(&result.stats_line(usage.messages, usage.current, usage.limit));
    }

    async fn shutdown(&mut self) {
        match self.controller.save().await {
            Ok(()) => self.console.success("Session saved. Goodbye!"),
            Err(e) => self
                .console
                .error(&format!("Failed to save session: {}", e)),
        }
        info!("exiting");
    }
}

enum Step {
    Continue,
    Generate(PendingTurn),
    Exit,
}

/// Completes with the running turn's result; never completes when idle
async fn wait_for(pending: &mut Option<PendingTurn>) -> Result<StreamingResult, JoinError> {
    match pending {
        Some(turn) => turn.await,
        None => std::future::pending().await,
    }
}
