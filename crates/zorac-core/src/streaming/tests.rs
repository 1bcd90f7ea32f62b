use super::*;
use crate::error::{ZoracError, ZoracResult};
use crate::llm::{ChatStream, Message, MessageRole, MockChatClient, StreamChunk};
use crate::tokens::{DEFAULT_ENCODING, TokenAccountant};
use futures::stream;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingRenderer {
    events: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
    cancel_after: Option<(usize, Arc<StreamCoordinator>)>,
}

impl RecordingRenderer {
    fn cancelling(after: usize, coordinator: Arc<StreamCoordinator>) -> Self {
        Self {
            cancel_after: Some((after, coordinator)),
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn appended(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("text:").map(str::to_string))
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn begin_block(&self, role: MessageRole) -> BlockHandle {
        self.events.lock().push(format!("begin:{}", role));
        BlockHandle(7)
    }

    fn append_text(&self, block: BlockHandle, fragment: &str) {
        assert_eq!(block, BlockHandle(7));
        let count = {
            let mut events = self.events.lock();
            events.push(format!("text:{}", fragment));
            events.iter().filter(|e| e.starts_with("text:")).count()
        };
        if let Some((after, coordinator)) = &self.cancel_after {
            if count == *after {
                coordinator.cancel_active();
            }
        }
    }

    fn finalize(&self, _block: BlockHandle) {
        self.events.lock().push("finalize".to_string());
    }

    fn update_status(&self, status: &str) {
        self.statuses.lock().push(status.to_string());
    }
}

fn chunk_stream(chunks: Vec<ZoracResult<StreamChunk>>) -> ChatStream {
    Box::pin(stream::iter(chunks))
}

fn accountant() -> TokenAccountant {
    TokenAccountant::new(DEFAULT_ENCODING).unwrap()
}

fn settings(stream_enabled: bool) -> GenerationSettings {
    GenerationSettings {
        model: "test-model".to_string(),
        temperature: 0.7,
        max_output_tokens: 256,
        stream_enabled,
    }
}

fn streaming_client(chunks: Vec<ZoracResult<StreamChunk>>) -> MockChatClient {
    let mut client = MockChatClient::new();
    client
        .expect_complete_stream()
        .withf(|req| req.stream && req.max_tokens == Some(256) && req.model == "test-model")
        .returning(move |_| Ok(chunk_stream(chunks.clone())));
    client
}

#[tokio::test]
async fn test_streamed_run_accumulates_fragments() {
    let client = streaming_client(vec![
        Ok(StreamChunk::empty(None)),
        Ok(StreamChunk::content("Hello")),
        Ok(StreamChunk::content(", ")),
        Ok(StreamChunk::empty(None)),
        Ok(StreamChunk::content("world!")),
        Ok(StreamChunk::final_chunk(Some("stop".to_string()))),
        Ok(StreamChunk::content("after the end")),
    ]);
    let coordinator = StreamCoordinator::new(Arc::new(client), accountant());
    let renderer = RecordingRenderer::default();

    let result = coordinator
        .run(vec![Message::user("hi")], &settings(true), &renderer)
        .await;

    assert_eq!(result.text, "Hello, world!");
    assert!(!result.cancelled);
    assert!(result.error.is_none());
    assert_eq!(result.tokens, accountant().count_text("Hello, world!"));
    assert!(result.is_appendable());

    assert_eq!(
        renderer.events(),
        vec!["begin:assistant", "text:Hello", "text:, ", "text:world!", "finalize"]
    );
    // one live update per non-empty fragment
    assert_eq!(renderer.statuses.lock().len(), 3);
    assert!(!coordinator.is_active());
}

#[tokio::test]
async fn test_non_streamed_run() {
    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|req| !req.stream)
        .times(1)
        .returning(|_| Ok("Complete answer".to_string()));
    let coordinator = StreamCoordinator::new(Arc::new(client), accountant());
    let renderer = RecordingRenderer::default();

    let result = coordinator
        .run(vec![Message::user("hi")], &settings(false), &renderer)
        .await;

    assert_eq!(result.text, "Complete answer");
    assert_eq!(result.tokens, accountant().count_text("Complete answer"));
    assert_eq!(renderer.appended(), vec!["Complete answer"]);
}

#[tokio::test]
async fn test_open_failure_is_reported() {
    let mut client = MockChatClient::new();
    client
        .expect_complete_stream()
        .returning(|_| Err(ZoracError::connection("connection refused")));
    let coordinator = StreamCoordinator::new(Arc::new(client), accountant());

    let result = coordinator
        .run(vec![Message::user("hi")], &settings(true), &RecordingRenderer::default())
        .await;

    assert!(!result.cancelled);
    assert!(result.text.is_empty());
    assert!(result.error.as_ref().is_some_and(|e| e.is_connection()));
    assert!(!result.is_appendable());
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_partial_text() {
    let client = streaming_client(vec![
        Ok(StreamChunk::content("partial")),
        Err(ZoracError::request("upstream closed")),
        Ok(StreamChunk::content("never seen")),
    ]);
    let coordinator = StreamCoordinator::new(Arc::new(client), accountant());

    let result = coordinator
        .run(vec![Message::user("hi")], &settings(true), &RecordingRenderer::default())
        .await;

    assert_eq!(result.text, "partial");
    assert_eq!(result.error, Some(ZoracError::request("upstream closed")));
    assert!(!result.cancelled);
}

#[tokio::test]
async fn test_cancel_stops_before_next_fragment() {
    let client = streaming_client(vec![
        Ok(StreamChunk::content("one ")),
        Ok(StreamChunk::content("two ")),
        Ok(StreamChunk::content("three ")),
        Ok(StreamChunk::content("four")),
    ]);
    let coordinator = Arc::new(StreamCoordinator::new(Arc::new(client), accountant()));
    let renderer = RecordingRenderer::cancelling(2, Arc::clone(&coordinator));

    let result = coordinator
        .run(vec![Message::user("hi")], &settings(true), &renderer)
        .await;

    assert!(result.cancelled);
    assert_eq!(result.text, "one two ");
    assert_eq!(renderer.appended(), vec!["one ", "two "]);
    assert!(!result.is_appendable());
    assert!(!coordinator.is_active());
}

#[tokio::test]
async fn test_cancel_while_waiting_for_fragment() {
    let mut client = MockChatClient::new();
    client
        .expect_complete_stream()
        .returning(|_| Ok(Box::pin(stream::pending::<ZoracResult<StreamChunk>>()) as ChatStream));
    let coordinator = Arc::new(StreamCoordinator::new(Arc::new(client), accountant()));
    let renderer = Arc::new(RecordingRenderer::default());

    let generation = coordinator.begin();
    let task = {
        let coordinator = Arc::clone(&coordinator);
        let renderer = Arc::clone(&renderer);
        tokio::spawn(async move {
            coordinator
                .run_registered(generation, vec![Message::user("hi")], &settings(true), renderer.as_ref())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(coordinator.cancel_active());

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run should stop after cancellation")
        .unwrap();
    assert!(result.cancelled);
    assert!(result.text.is_empty());
}

#[tokio::test]
async fn test_new_generation_supersedes_previous() {
    let client = streaming_client(vec![Ok(StreamChunk::content("fresh"))]);
    let coordinator = StreamCoordinator::new(Arc::new(client), accountant());

    let first = coordinator.begin();
    let second = coordinator.begin();
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    let stale = coordinator
        .run_registered(first, vec![], &settings(true), &RecordingRenderer::default())
        .await;
    assert!(stale.cancelled);
    // the stale run must not clear the newer registration
    assert!(coordinator.is_active());

    let fresh = coordinator
        .run_registered(second, vec![], &settings(true), &RecordingRenderer::default())
        .await;
    assert_eq!(fresh.text, "fresh");
    assert!(!coordinator.is_active());
}

#[test]
fn test_cancel_when_idle() {
    let coordinator = StreamCoordinator::new(Arc::new(MockChatClient::new()), accountant());
    assert!(!coordinator.cancel_active());
}
