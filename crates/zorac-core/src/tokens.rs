//! Token accounting
//!
//! Exact BPE counts for messages in the chat-completion format. Each message
//! costs a fixed framing overhead plus its encoded content, and every request
//! pays a small constant for the assistant reply priming.

use crate::error::{ZoracError, ZoracResult};
use crate::llm::Message;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Framing tokens charged for every message
pub const MESSAGE_OVERHEAD: usize = 4;
/// Tokens charged once per request for the reply priming
pub const REPLY_PRIMING: usize = 2;
/// Encoding used when none is configured or the configured one is unknown
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Loaded encodings by id
static ENCODINGS: Lazy<Mutex<HashMap<String, Arc<CoreBPE>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn load_encoding(id: &str) -> ZoracResult<Arc<CoreBPE>> {
    let mut cache = ENCODINGS.lock();
    if let Some(bpe) = cache.get(id) {
        return Ok(Arc::clone(bpe));
    }

    let built = match id {
        "cl100k_base" => tiktoken_rs::cl100k_base(),
        "o200k_base" => tiktoken_rs::o200k_base(),
        "p50k_base" => tiktoken_rs::p50k_base(),
        "p50k_edit" => tiktoken_rs::p50k_edit(),
        "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
        _ => return Err(ZoracError::unknown_encoding(id)),
    };
    let bpe = Arc::new(built.map_err(|e| {
        ZoracError::config_for_key(
            format!("Failed to load encoding {}: {}", id, e),
            "TIKTOKEN_ENCODING",
        )
    })?);

    debug!(encoding = id, "loaded tokenizer encoding");
    cache.insert(id.to_string(), Arc::clone(&bpe));
    Ok(bpe)
}

/// Counts tokens for text and message lists with a named BPE encoding.
#[derive(Clone)]
pub struct TokenAccountant {
    encoding: String,
    bpe: Arc<CoreBPE>,
}

impl fmt::Debug for TokenAccountant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAccountant")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl TokenAccountant {
    /// Build an accountant for `encoding`, failing on unknown ids.
    pub fn new(encoding: &str) -> ZoracResult<Self> {
        let bpe = load_encoding(encoding)?;
        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    /// Build an accountant for `encoding`, substituting the default encoding
    /// with a warning when the id is not recognised.
    pub fn with_fallback(encoding: &str) -> ZoracResult<Self> {
        match Self::new(encoding) {
            Err(ZoracError::UnknownEncoding { .. }) => {
                warn!(
                    "Unknown encoding '{}', falling back to {}",
                    encoding, DEFAULT_ENCODING
                );
                Self::new(DEFAULT_ENCODING)
            }
            other => other,
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Token count of raw text
    pub fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    /// Cost of one message: framing plus its encoded role and content
    pub fn message_cost(&self, message: &Message) -> usize {
        MESSAGE_OVERHEAD
            + self.count_text(message.role.as_str())
            + self.count_text(&message.content)
    }

    /// Total prompt size of a message list: per-message costs plus the
    /// reply priming. An empty list costs exactly the priming.
    pub fn count(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.message_cost(m))
            .sum::<usize>()
            + REPLY_PRIMING
    }
}
