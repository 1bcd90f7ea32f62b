//! Streaming response types

use crate::error::ZoracResult;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A chunk of streaming response data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental content; `None` when the fragment carried no text
    pub content: Option<String>,
    /// Whether this is the end-of-stream marker
    pub is_final: bool,
    /// Finish reason reported by the endpoint, if any
    pub finish_reason: Option<String>,
}

impl StreamChunk {
    /// Create a new content chunk
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_final: false,
            finish_reason: None,
        }
    }

    /// Create a chunk that carries no text (role-only or keep-alive deltas)
    pub fn empty(finish_reason: Option<String>) -> Self {
        Self {
            content: None,
            is_final: false,
            finish_reason,
        }
    }

    /// Create the end-of-stream chunk
    pub fn final_chunk(finish_reason: Option<String>) -> Self {
        Self {
            content: None,
            is_final: true,
            finish_reason,
        }
    }

    /// Text carried by this chunk, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Stream of response chunks
pub type ChatStream = Pin<Box<dyn Stream<Item = ZoracResult<StreamChunk>> + Send>>;
