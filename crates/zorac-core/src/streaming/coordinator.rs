//! Single-flight generation runner

use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::ZoracError;
use crate::llm::{ChatClient, ChatRequest, Message, MessageRole};
use crate::streaming::metrics::{LiveMetrics, tokens_per_second};
use crate::streaming::render::{BlockHandle, Renderer};
use crate::streaming::result::StreamingResult;
use crate::tokens::TokenAccountant;

/// Per-generation request settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub stream_enabled: bool,
}

/// Registration of the generation currently allowed to run
#[derive(Debug, Clone)]
pub struct Generation {
    id: u64,
    token: CancellationToken,
}

impl Generation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

enum RunEnd {
    Completed,
    Cancelled,
    Failed(ZoracError),
}

/// Runs completions one at a time.
///
/// Registering a new generation cancels the one still running, so a second
/// request supersedes rather than queues.
pub struct StreamCoordinator {
    client: RwLock<Arc<dyn ChatClient>>,
    accountant: RwLock<TokenAccountant>,
    active: Mutex<Option<Generation>>,
    next_id: AtomicU64,
}

impl StreamCoordinator {
    pub fn new(client: Arc<dyn ChatClient>, accountant: TokenAccountant) -> Self {
        Self {
            client: RwLock::new(client),
            accountant: RwLock::new(accountant),
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Shared handle to the inference client
    pub fn client(&self) -> Arc<dyn ChatClient> {
        self.client.read().clone()
    }

    /// Swap the inference client; a running generation keeps the old one
    pub fn replace_client(&self, client: Arc<dyn ChatClient>) {
        *self.client.write() = client;
    }

    pub fn set_accountant(&self, accountant: TokenAccountant) {
        *self.accountant.write() = accountant;
    }

    /// Register a new generation, cancelling any still registered
    pub fn begin(&self) -> Generation {
        let generation = Generation {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            token: CancellationToken::new(),
        };
        let previous = self.active.lock().replace(generation.clone());
        if let Some(previous) = previous {
            debug!(superseded = previous.id, by = generation.id, "superseding generation");
            previous.token.cancel();
        }
        generation
    }

    /// Cancel the registered generation. Returns whether one was running.
    pub fn cancel_active(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(generation) => {
                generation.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    fn finish(&self, generation: &Generation) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|g| g.id == generation.id) {
            *active = None;
        }
    }

    /// Register and run a generation over `messages`
    pub async fn run(
        &self,
        messages: Vec<Message>,
        settings: &GenerationSettings,
        renderer: &dyn Renderer,
    ) -> StreamingResult {
        let generation = self.begin();
        self.run_registered(generation, messages, settings, renderer)
            .await
    }

    /// Run a generation registered earlier with [`begin`](Self::begin).
    ///
    /// Never fails: request errors and cancellation are reported in the
    /// returned result.
    #[instrument(skip_all, fields(generation = generation.id, messages = messages.len(), stream = settings.stream_enabled))]
    pub async fn run_registered(
        &self,
        generation: Generation,
        messages: Vec<Message>,
        settings: &GenerationSettings,
        renderer: &dyn Renderer,
    ) -> StreamingResult {
        let client = self.client();
        let accountant = self.accountant.read().clone();
        let request = ChatRequest::new(settings.model.clone(), messages)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_output_tokens)
            .streaming(settings.stream_enabled);

        let start = Instant::now();
        let block = renderer.begin_block(MessageRole::Assistant);
        let mut text = String::new();

        let end = if generation.is_cancelled() {
            RunEnd::Cancelled
        } else if settings.stream_enabled {
            stream_into(
                client.as_ref(),
                &request,
                &generation.token,
                &accountant,
                renderer,
                block,
                start,
                &mut text,
            )
            .await
        } else {
            complete_into(client.as_ref(), &request, &generation.token, renderer, block, &mut text)
                .await
        };

        renderer.finalize(block);
        self.finish(&generation);

        let duration = start.elapsed();
        let tokens = accountant.count_text(&text);
        let (cancelled, error) = match end {
            RunEnd::Completed => (false, None),
            RunEnd::Cancelled => {
                debug!(chars = text.len(), "generation cancelled");
                (true, None)
            }
            RunEnd::Failed(e) => {
                warn!("Generation failed: {}", e);
                (false, Some(e))
            }
        };

        StreamingResult {
            text,
            tokens,
            duration,
            tokens_per_second: tokens_per_second(tokens, duration),
            cancelled,
            error,
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn stream_into(
    client: &dyn ChatClient,
    request: &ChatRequest,
    token: &CancellationToken,
    accountant: &TokenAccountant,
    renderer: &dyn Renderer,
    block: BlockHandle,
    start: Instant,
    text: &mut String,
) -> RunEnd {
    let mut stream = tokio::select! {
        biased;
        _ = token.cancelled() => return RunEnd::Cancelled,
        opened = client.complete_stream(request) => match opened {
            Ok(stream) => stream,
            Err(e) => return RunEnd::Failed(e),
        },
    };

    let mut live = LiveMetrics::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return RunEnd::Cancelled,
            next = stream.next() => next,
        };

        // A fragment that raced a cancellation is dropped
        if token.is_cancelled() {
            return RunEnd::Cancelled;
        }

        match next {
            None => return RunEnd::Completed,
            Some(Err(e)) => return RunEnd::Failed(e),
            Some(Ok(chunk)) if chunk.is_final => return RunEnd::Completed,
            Some(Ok(chunk)) => {
                let fragment = chunk.text();
                if fragment.is_empty() {
                    continue;
                }
                text.push_str(fragment);
                renderer.append_text(block, fragment);
                live.record(accountant.count_text(fragment), start.elapsed());
                renderer.update_metrics(&live);
            }
        }
    }
}

async fn complete_into(
    client: &dyn ChatClient,
    request: &ChatRequest,
    token: &CancellationToken,
    renderer: &dyn Renderer,
    block: BlockHandle,
    text: &mut String,
) -> RunEnd {
    let response = tokio::select! {
        biased;
        _ = token.cancelled() => return RunEnd::Cancelled,
        response = client.complete(request) => response,
    };

    match response {
        Ok(content) => {
            if !content.is_empty() {
                renderer.append_text(block, &content);
            }
            *text = content;
            RunEnd::Completed
        }
        Err(e) => RunEnd::Failed(e),
    }
}
