//! Conversation context management
//!
//! The [`ContextController`] owns the message list for the lifetime of the
//! process. It keeps the prompt under the configured input budget by folding
//! older messages into a single summary produced by the [`Summarizer`].

mod controller;
mod partition;
mod result;
mod summarizer;

pub use controller::{
    AppendOutcome, ContextController, ContextSettings, LoadOutcome, SystemPromptFn, TokenUsage,
};
pub use partition::Partition;
pub use result::{CompactResult, ContextStats};
pub use summarizer::{SUMMARY_PREFIX, SUMMARY_TEMPERATURE, Summarizer, is_summary};

#[cfg(test)]
mod tests;
