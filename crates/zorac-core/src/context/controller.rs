//! Owner of the conversation message list

use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::context::partition::Partition;
use crate::context::result::{CompactResult, ContextStats};
use crate::context::summarizer::{SUMMARY_PREFIX, Summarizer, is_summary};
use crate::error::{ZoracError, ZoracResult};
use crate::llm::{ChatClient, Message};
use crate::session::SessionStore;
use crate::streaming::StreamingResult;
use crate::tokens::TokenAccountant;

const SUMMARY_PREVIEW_CHARS: usize = 120;

/// Builds the primary system message for a given calendar date
pub type SystemPromptFn = Arc<dyn Fn(NaiveDate) -> String + Send + Sync>;

/// Budget settings read by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSettings {
    pub max_input_tokens: usize,
    pub keep_recent_messages: usize,
}

/// How the initial conversation was obtained
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A stored session was restored
    Restored { messages: usize },
    /// Nothing stored yet
    Fresh,
    /// The stored session could not be parsed; started fresh
    Corrupt(ZoracError),
    /// The stored session could not be read; started fresh
    Unreadable(ZoracError),
}

/// What happened to a finished generation
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// Appended and persisted
    Saved,
    /// Appended, but persisting failed; the conversation continues in memory
    Unsaved(ZoracError),
    /// Cancelled, failed or empty; the sequence is unchanged
    Discarded,
}

/// Token budget snapshot for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub current: usize,
    pub limit: usize,
    pub remaining: usize,
    pub messages: usize,
}

/// Owns the ordered message list and applies the compaction policy.
///
/// Every mutation either applies completely or leaves the list untouched;
/// summarizer and persistence failures are absorbed into the documented
/// fallbacks instead of being raised.
pub struct ContextController {
    messages: Vec<Message>,
    accountant: TokenAccountant,
    summarizer: Summarizer,
    store: Arc<dyn SessionStore>,
    settings: ContextSettings,
    system_prompt: SystemPromptFn,
    prompt_date: NaiveDate,
    stats: ContextStats,
}

impl ContextController {
    /// Controller holding only a freshly built primary system message
    pub fn new(
        accountant: TokenAccountant,
        summarizer: Summarizer,
        store: Arc<dyn SessionStore>,
        settings: ContextSettings,
        system_prompt: SystemPromptFn,
    ) -> Self {
        let today = Local::now().date_naive();
        Self {
            messages: vec![Message::system(system_prompt(today))],
            accountant,
            summarizer,
            store,
            settings,
            system_prompt,
            prompt_date: today,
            stats: ContextStats::default(),
        }
    }

    /// Controller restored from the session store, falling back to a fresh
    /// conversation when nothing usable is stored.
    pub async fn bootstrap(
        accountant: TokenAccountant,
        summarizer: Summarizer,
        store: Arc<dyn SessionStore>,
        settings: ContextSettings,
        system_prompt: SystemPromptFn,
    ) -> (Self, LoadOutcome) {
        let mut controller = Self::new(accountant, summarizer, store, settings, system_prompt);

        let outcome = match controller.store.load().await {
            Ok(messages) if messages.is_empty() => LoadOutcome::Fresh,
            Ok(messages) => {
                let count = messages.len();
                controller.messages = messages;
                controller.rebuild_primary();
                info!("Restored {} messages from {}", count, controller.store.location());
                LoadOutcome::Restored { messages: count }
            }
            Err(ZoracError::SessionNotFound { .. }) => LoadOutcome::Fresh,
            Err(e @ ZoracError::SessionCorrupt { .. }) => {
                warn!("Stored session is corrupt, starting fresh: {}", e);
                LoadOutcome::Corrupt(e)
            }
            Err(e) => {
                warn!("Could not read stored session, starting fresh: {}", e);
                LoadOutcome::Unreadable(e)
            }
        };

        (controller, outcome)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the sequence, for a generation request
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn settings(&self) -> ContextSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: ContextSettings) {
        self.settings = settings;
    }

    pub fn accountant(&self) -> &TokenAccountant {
        &self.accountant
    }

    pub fn set_accountant(&mut self, accountant: TokenAccountant) {
        self.accountant = accountant;
    }

    pub fn set_summary_model(&mut self, model: impl Into<String>) {
        self.summarizer.set_model(model);
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    pub fn token_count(&self) -> usize {
        self.accountant.count(&self.messages)
    }

    pub fn token_usage(&self) -> TokenUsage {
        let current = self.token_count();
        TokenUsage {
            current,
            limit: self.settings.max_input_tokens,
            remaining: self.settings.max_input_tokens.saturating_sub(current),
            messages: self.messages.len(),
        }
    }

    /// Append a user message. No budget check happens here.
    pub fn append_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Compact when the prompt exceeds the input budget.
    ///
    /// Within budget this never touches the sequence. Does not persist; the
    /// next assistant append saves the compacted list.
    pub async fn check_budget(&mut self, client: &dyn ChatClient) -> CompactResult {
        let tokens = self.token_count();
        if tokens <= self.settings.max_input_tokens {
            let result = CompactResult::not_needed(self.messages.len(), tokens);
            self.stats.record(&result);
            return result;
        }

        info!(
            tokens,
            limit = self.settings.max_input_tokens,
            "context over budget, compacting"
        );
        self.compact(client).await
    }

    /// Compact regardless of budget and persist the result.
    ///
    /// Persistence failure is logged; the compacted sequence stays in memory.
    pub async fn force_summarize(&mut self, client: &dyn ChatClient) -> CompactResult {
        let result = self.compact(client).await;
        if result.was_compacted {
            self.persist().await;
        }
        result
    }

    /// Whether there is anything older than the recent window to fold
    pub fn can_summarize(&self) -> bool {
        self.messages.len() > self.settings.keep_recent_messages + 1
    }

    #[instrument(skip_all, fields(messages = self.messages.len()))]
    async fn compact(&mut self, client: &dyn ChatClient) -> CompactResult {
        let messages_before = self.messages.len();
        let tokens_before = self.token_count();

        let partition = Partition::new(&self.messages, self.settings.keep_recent_messages);
        if !partition.has_old() {
            let result = CompactResult::not_needed(messages_before, tokens_before);
            self.stats.record(&result);
            return result;
        }

        let folded = partition.old.len();
        let (summary, fallback_error) =
            match self.summarizer.summarize(partition.old, client).await {
                Ok(summary) => (Some(summary), None),
                Err(e) => {
                    warn!("Summarization failed, dropping {} older messages: {}", folded, e);
                    (None, Some(e))
                }
            };

        let mut compacted = Vec::with_capacity(2 + partition.recent.len());
        compacted.extend(partition.head.cloned());
        compacted.extend(summary.clone());
        compacted.extend_from_slice(partition.recent);

        self.messages = compacted;

        let result = CompactResult {
            was_compacted: true,
            messages_before,
            messages_after: self.messages.len(),
            tokens_before,
            tokens_after: self.token_count(),
            messages_compacted: folded,
            compacted_at: Some(Utc::now()),
            summary_preview: summary.map(|s| preview(&s.content[SUMMARY_PREFIX.len()..])),
            fallback_error,
        };
        self.stats.record(&result);

        debug!(
            before = result.tokens_before,
            after = result.tokens_after,
            "compaction complete"
        );
        result
    }

    /// Record a finished generation.
    ///
    /// Only a complete, non-empty, uncancelled response becomes an assistant
    /// message, and only then is the sequence saved.
    pub async fn append_assistant(&mut self, result: &StreamingResult) -> AppendOutcome {
        if !result.is_appendable() {
            debug!(
                cancelled = result.cancelled,
                failed = result.error.is_some(),
                "discarding response"
            );
            return AppendOutcome::Discarded;
        }

        self.messages.push(Message::assistant(result.text.clone()));
        match self.persist().await {
            None => AppendOutcome::Saved,
            Some(e) => AppendOutcome::Unsaved(e),
        }
    }

    /// Drop everything but a freshly built primary system message and save.
    ///
    /// The in-memory reset applies even when saving fails.
    pub async fn reset(&mut self) -> ZoracResult<()> {
        let today = Local::now().date_naive();
        self.messages = vec![Message::system((self.system_prompt)(today))];
        self.prompt_date = today;
        self.save().await
    }

    /// Persist the current sequence
    pub async fn save(&self) -> ZoracResult<()> {
        self.store.save(&self.messages).await
    }

    /// Replace the sequence with the stored one, with a primary system
    /// message built for today. On failure the in-memory sequence is left as
    /// it was.
    pub async fn reload(&mut self) -> ZoracResult<usize> {
        let messages = self.store.load().await?;
        if messages.is_empty() {
            return Err(ZoracError::session_not_found(self.store.location()));
        }
        self.messages = messages;
        self.prompt_date = Local::now().date_naive();
        self.rebuild_primary();
        Ok(self.messages.len())
    }

    pub fn store_location(&self) -> String {
        self.store.location()
    }

    /// Text of the current summary, without its prefix
    pub fn current_summary(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| is_summary(m))
            .map(|m| &m.content[SUMMARY_PREFIX.len()..])
    }

    /// Rebuild the primary system message if the calendar date changed since
    /// it was built. Returns whether it was rebuilt.
    pub fn refresh_system_message(&mut self) -> bool {
        self.refresh_system_message_on(Local::now().date_naive())
    }

    pub fn refresh_system_message_on(&mut self, today: NaiveDate) -> bool {
        if today == self.prompt_date {
            return false;
        }
        self.prompt_date = today;
        self.rebuild_primary();
        true
    }

    fn rebuild_primary(&mut self) {
        let prompt = Message::system((self.system_prompt)(self.prompt_date));
        match self.messages.first_mut() {
            Some(first) if first.is_system() && !is_summary(first) => *first = prompt,
            _ => self.messages.insert(0, prompt),
        }
    }

    async fn persist(&self) -> Option<ZoracError> {
        match self.save().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to save session to {}: {}", self.store.location(), e);
                Some(e)
            }
        }
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SUMMARY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
