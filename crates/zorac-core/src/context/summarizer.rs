//! Conversation summarization for context compression

use tracing::{debug, instrument};

use crate::error::{ZoracError, ZoracResult};
use crate::llm::{ChatClient, ChatRequest, Message, MessageRole};

/// Content prefix identifying the summary message in a conversation
pub const SUMMARY_PREFIX: &str = "Previous conversation summary: ";

/// Sampling temperature for summary requests, independent of chat settings
pub const SUMMARY_TEMPERATURE: f32 = 0.1;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries.";

const SUMMARY_INSTRUCTION: &str = "Please create a concise summary of this conversation history, \
preserving key facts, decisions, and context:";

/// Whether `message` is a summary produced by [`Summarizer`]
pub fn is_summary(message: &Message) -> bool {
    message.role == MessageRole::System && message.content.starts_with(SUMMARY_PREFIX)
}

/// Folds older messages into one system message through a dedicated,
/// non-streamed completion request.
#[derive(Debug, Clone)]
pub struct Summarizer {
    model: String,
}

impl Summarizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Summarize `older` into a single system message.
    ///
    /// A previous summary inside `older` is part of the transcript, so
    /// repeated compactions fold into one summary. An empty reply is an error.
    #[instrument(skip(self, older, client), fields(messages = older.len()), level = "debug")]
    pub async fn summarize(&self, older: &[Message], client: &dyn ChatClient) -> ZoracResult<Message> {
        let transcript = transcript(older);
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                Message::system(SUMMARY_SYSTEM_PROMPT),
                Message::user(format!("{}\n\n{}", SUMMARY_INSTRUCTION, transcript)),
            ],
        )
        .with_temperature(SUMMARY_TEMPERATURE)
        .streaming(false);

        let summary = client.complete(&request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(ZoracError::request("Summarizer returned an empty summary"));
        }

        debug!(chars = summary.len(), "summary generated");
        Ok(Message::system(format!("{}{}", SUMMARY_PREFIX, summary)))
    }
}

/// Role-prefixed transcript, one block per message
fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
