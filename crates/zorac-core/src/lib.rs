//! Zorac Core Library
//!
//! Conversation context controller for the Zorac terminal chat client:
//! token accounting, session persistence, summarization-based compaction and
//! single-flight streaming against an OpenAI-compatible inference endpoint.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod session;
pub mod streaming;
pub mod tokens;

// Re-export commonly used types
pub use config::{ConfigKey, ConfigStore, Overrides, Settings, ZoracPaths};
pub use context::{
    AppendOutcome, CompactResult, ContextController, ContextSettings, LoadOutcome, Summarizer,
    TokenUsage,
};
pub use error::{ZoracError, ZoracResult};
pub use llm::{ChatClient, ChatRequest, Message, MessageRole, OpenAiCompatClient};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use streaming::{
    BlockHandle, GenerationSettings, LiveMetrics, Renderer, StreamCoordinator, StreamingResult,
};
pub use tokens::TokenAccountant;
