//! Result and statistics types for compaction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ZoracError;

/// Result of a compaction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactResult {
    /// Whether the message list was rewritten
    pub was_compacted: bool,
    pub messages_before: usize,
    pub messages_after: usize,
    pub tokens_before: usize,
    pub tokens_after: usize,
    /// Number of messages folded into the summary (or dropped on fallback)
    pub messages_compacted: usize,
    pub compacted_at: Option<DateTime<Utc>>,
    /// First characters of the new summary
    pub summary_preview: Option<String>,
    /// Summarizer failure that forced the drop-without-summary fallback
    #[serde(skip)]
    pub fallback_error: Option<ZoracError>,
}

impl CompactResult {
    /// A result indicating no compaction was needed
    pub fn not_needed(messages: usize, tokens: usize) -> Self {
        Self {
            was_compacted: false,
            messages_before: messages,
            messages_after: messages,
            tokens_before: tokens,
            tokens_after: tokens,
            messages_compacted: 0,
            compacted_at: None,
            summary_preview: None,
            fallback_error: None,
        }
    }

    pub fn tokens_saved(&self) -> usize {
        self.tokens_before.saturating_sub(self.tokens_after)
    }

    /// Whether the summary step failed and old messages were dropped
    pub fn used_fallback(&self) -> bool {
        self.fallback_error.is_some()
    }
}

/// Running statistics over the controller's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_compactions: u64,
    pub total_tokens_saved: u64,
    pub total_messages_compacted: u64,
    /// Budget checks that found the prompt within limits
    pub skipped_count: u64,
    /// Compactions that fell back to dropping old messages
    pub fallback_count: u64,
    pub last_compaction: Option<DateTime<Utc>>,
}

impl ContextStats {
    pub(crate) fn record(&mut self, result: &CompactResult) {
        if !result.was_compacted {
            self.skipped_count += 1;
            return;
        }
        self.total_compactions += 1;
        self.total_tokens_saved += result.tokens_saved() as u64;
        self.total_messages_compacted += result.messages_compacted as u64;
        if result.used_fallback() {
            self.fallback_count += 1;
        }
        self.last_compaction = result.compacted_at;
    }
}
