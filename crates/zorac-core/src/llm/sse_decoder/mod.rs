//! Server-Sent Events decoder for chat-completion streams
//!
//! The endpoint streams `data: <json>` records separated by blank lines and
//! terminates with `data: [DONE]`. Network chunks do not respect record or
//! character boundaries, so the decoder buffers both partial records and
//! partial UTF-8 sequences until they complete.

mod event;

pub use event::SseEvent;

/// Buffered SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Decoded text not yet terminated by a blank line
    pending: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    carry: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every event completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let (text, rest) = split_utf8(&bytes);
        self.pending.push_str(&text);
        self.carry = rest;

        if self.pending.contains('\r') {
            self.pending = self.pending.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(end) = self.pending.find("\n\n") {
            let record: String = self.pending.drain(..end + 2).collect();
            if let Some(event) = parse_record(&record) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing record that was never terminated by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        let record = std::mem::take(&mut self.pending);
        self.carry.clear();
        parse_record(&record)
    }

    /// Whether undelivered data is still buffered
    pub fn has_remaining(&self) -> bool {
        !self.pending.trim().is_empty() || !self.carry.is_empty()
    }
}

/// Split bytes into the longest valid UTF-8 prefix and an incomplete tail.
/// Invalid sequences in the middle are replaced rather than carried.
fn split_utf8(bytes: &[u8]) -> (String, Vec<u8>) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), Vec::new()),
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&bytes[..valid]).into_owned();
            (text, bytes[valid..].to_vec())
        }
        Err(e) => {
            tracing::warn!(
                position = e.valid_up_to(),
                "invalid UTF-8 in event stream, replacing"
            );
            (String::from_utf8_lossy(bytes).into_owned(), Vec::new())
        }
    }
}

fn parse_record(record: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data: Vec<&str> = Vec::new();

    for line in record.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim().to_string());
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data.join("\n"),
    })
}
