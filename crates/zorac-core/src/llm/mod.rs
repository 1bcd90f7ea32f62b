//! Inference endpoint client and message types

pub mod client;
pub mod messages;
pub mod sse_decoder;
pub mod streaming;

pub use client::{ChatClient, ChatRequest, OpenAiCompatClient};
pub use messages::{Message, MessageRole};
pub use sse_decoder::{SseDecoder, SseEvent};
pub use streaming::{ChatStream, StreamChunk};

#[cfg(test)]
pub use client::MockChatClient;
