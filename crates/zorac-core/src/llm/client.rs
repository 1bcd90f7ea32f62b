//! Chat-completion client for OpenAI-compatible endpoints

use crate::error::{ZoracError, ZoracResult};
use crate::llm::messages::Message;
use crate::llm::sse_decoder::{SseDecoder, SseEvent};
use crate::llm::streaming::{ChatStream, StreamChunk};
use async_trait::async_trait;
use futures::{Stream, StreamExt, future, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const MODELS_TIMEOUT: Duration = Duration::from_secs(5);

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.1,
            max_tokens: None,
            stream: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Chat-completion capability consumed by the summarizer and the stream
/// coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single non-streamed completion, returning the assistant text
    async fn complete(&self, request: &ChatRequest) -> ZoracResult<String>;

    /// Streamed completion yielding text fragments
    async fn complete_stream(&self, request: &ChatRequest) -> ZoracResult<ChatStream>;

    /// Model ids served by the endpoint; doubles as a reachability probe
    async fn list_models(&self) -> ZoracResult<Vec<String>>;
}

/// Client for any server exposing the OpenAI chat-completions API (vLLM,
/// llama.cpp server, OpenAI itself).
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> ZoracResult<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client whose requests, response bodies included, give up after
    /// `request_timeout`
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> ZoracResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                ZoracError::connection_to(format!("Failed to create HTTP client: {}", e), &base_url)
            })?;

        debug!(
            "Created chat client for {} (timeout {}s)",
            base_url,
            request_timeout.as_secs()
        );

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_chat(&self, request: &ChatRequest) -> ZoracResult<reqwest::Response> {
        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatClient for OpenAiCompatClient {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()), level = "debug")]
    async fn complete(&self, request: &ChatRequest) -> ZoracResult<String> {
        let mut body = request.clone();
        body.stream = false;

        let response = self.post_chat(&body).await?;
        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ZoracError::request(format!("Failed to parse completion: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ZoracError::request("Completion contained no choices"))
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()), level = "debug")]
    async fn complete_stream(&self, request: &ChatRequest) -> ZoracResult<ChatStream> {
        let mut body = request.clone();
        body.stream = true;

        let response = self.post_chat(&body).await?;
        Ok(Box::pin(decode_chunks(response.bytes_stream())))
    }

    async fn list_models(&self) -> ZoracResult<Vec<String>> {
        let response = self
            .http
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .timeout(MODELS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let models: ModelList = response
            .json()
            .await
            .map_err(|e| ZoracError::request(format!("Failed to parse model list: {}", e)))?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

/// Decode a response body into stream chunks. A final record left without
/// its blank-line terminator is flushed when the body ends.
pub(crate) fn decode_chunks<S, B, E>(body: S) -> impl Stream<Item = ZoracResult<StreamChunk>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ZoracError>,
{
    body.map(Some)
        .chain(stream::once(future::ready(None)))
        .scan(SseDecoder::new(), |decoder, item| {
            let batch: Vec<ZoracResult<StreamChunk>> = match item {
                Some(Ok(bytes)) => decoder
                    .feed(bytes.as_ref())
                    .iter()
                    .map(parse_stream_event)
                    .collect(),
                Some(Err(e)) => vec![Err(e.into())],
                None => {
                    if decoder.has_remaining() {
                        debug!("flushing unterminated final stream record");
                    }
                    decoder.finish().iter().map(parse_stream_event).collect()
                }
            };
            future::ready(Some(batch))
        })
        .flat_map(stream::iter)
}

/// Turn one SSE record into a stream chunk.
pub(crate) fn parse_stream_event(event: &SseEvent) -> ZoracResult<StreamChunk> {
    if event.is_done() {
        return Ok(StreamChunk::final_chunk(None));
    }

    let value: serde_json::Value = serde_json::from_str(&event.data)
        .map_err(|e| ZoracError::request(format!("Malformed stream record: {}", e)))?;

    if let Some(error) = value.get("error") {
        return Err(ZoracError::request(error_message(error)));
    }

    let chunk: ChatCompletionChunk = serde_json::from_value(value)
        .map_err(|e| ZoracError::request(format!("Unexpected stream record: {}", e)))?;

    Ok(match chunk.choices.into_iter().next() {
        Some(ChunkChoice {
            delta: ChunkDelta {
                content: Some(text),
            },
            finish_reason,
        }) if !text.is_empty() => StreamChunk {
            content: Some(text),
            is_final: false,
            finish_reason,
        },
        Some(choice) => StreamChunk::empty(choice.finish_reason),
        None => StreamChunk::empty(None),
    })
}

async fn error_from_response(response: reqwest::Response) -> ZoracError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").map(error_message))
        .unwrap_or(body);

    ZoracError::request_with_status(
        format!("Endpoint returned {}: {}", status, detail.trim()),
        status.as_u16(),
    )
}

/// Error payloads come as either `{"error": "text"}` or
/// `{"error": {"message": "text", ...}}`.
fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
