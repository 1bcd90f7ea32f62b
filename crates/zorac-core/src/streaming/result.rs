use std::time::Duration;

use crate::error::ZoracError;

/// Outcome of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingResult {
    /// Accumulated response text (partial when cancelled or failed)
    pub text: String,
    /// Authoritative token count of `text`
    pub tokens: usize,
    pub duration: Duration,
    pub tokens_per_second: f64,
    pub cancelled: bool,
    /// Request failure, reported to the user rather than raised
    pub error: Option<ZoracError>,
}

impl StreamingResult {
    /// Whether the text may become an assistant message
    pub fn is_appendable(&self) -> bool {
        !self.cancelled && self.error.is_none() && !self.text.is_empty()
    }

    /// One-line summary shown after a turn
    pub fn stats_line(&self, total_messages: usize, context_tokens: usize, max_input_tokens: usize) -> String {
        format!(
            "{} tokens in {:.1}s ({:.1} tok/s) | Total: {} msgs, ~{}/{} tokens",
            self.tokens,
            self.duration.as_secs_f64(),
            self.tokens_per_second,
            total_messages,
            context_tokens,
            max_input_tokens
        )
    }
}
