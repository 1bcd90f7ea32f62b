#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use zorac_core::context::SystemPromptFn;
use zorac_core::llm::{ChatStream, StreamChunk};
use zorac_core::{
    BlockHandle, ChatClient, ChatRequest, ContextController, ContextSettings, MemorySessionStore,
    MessageRole, Renderer, SessionStore, Summarizer, TokenAccountant, ZoracError, ZoracResult,
};

/// Client replaying canned replies and recording every request
#[derive(Default)]
pub struct ScriptedClient {
    completions: Mutex<VecDeque<ZoracResult<String>>>,
    streams: Mutex<VecDeque<Vec<ZoracResult<StreamChunk>>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, reply: ZoracResult<String>) -> Self {
        self.completions.lock().push_back(reply);
        self
    }

    pub fn with_stream(self, chunks: Vec<ZoracResult<StreamChunk>>) -> Self {
        self.streams.lock().push_back(chunks);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, request: &ChatRequest) -> ZoracResult<String> {
        self.requests.lock().push(request.clone());
        self.completions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ZoracError::connection("no scripted completion")))
    }

    async fn complete_stream(&self, request: &ChatRequest) -> ZoracResult<ChatStream> {
        self.requests.lock().push(request.clone());
        let chunks = self
            .streams
            .lock()
            .pop_front()
            .ok_or_else(|| ZoracError::connection("no scripted stream"))?;
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn list_models(&self) -> ZoracResult<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }
}

/// Renderer that discards output
pub struct SilentRenderer;

impl Renderer for SilentRenderer {
    fn begin_block(&self, _role: MessageRole) -> BlockHandle {
        BlockHandle(0)
    }
    fn append_text(&self, _block: BlockHandle, _fragment: &str) {}
    fn finalize(&self, _block: BlockHandle) {}
    fn update_status(&self, _status: &str) {}
}

pub fn accountant() -> TokenAccountant {
    TokenAccountant::new("cl100k_base").expect("default encoding")
}

pub fn prompt() -> SystemPromptFn {
    Arc::new(|_: NaiveDate| "S".to_string())
}

pub fn controller(
    store: Arc<dyn SessionStore>,
    max_input_tokens: usize,
    keep_recent_messages: usize,
) -> ContextController {
    ContextController::new(
        accountant(),
        Summarizer::new("scripted"),
        store,
        ContextSettings {
            max_input_tokens,
            keep_recent_messages,
        },
        prompt(),
    )
}

pub fn memory_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new())
}
