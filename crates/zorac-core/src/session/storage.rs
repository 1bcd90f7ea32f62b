//! Session storage backends
//!
//! A session is the flat message list serialized as one pretty-printed JSON
//! array. Every save rewrites the whole file.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tracing::debug;

use crate::error::{ZoracError, ZoracResult};
use crate::llm::Message;

/// Session storage trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the full message sequence, replacing any previous save
    async fn save(&self, messages: &[Message]) -> ZoracResult<()>;

    /// Load the stored sequence.
    ///
    /// Fails with `SessionNotFound` when nothing was saved yet and with
    /// `SessionCorrupt` when the stored form is not a valid message list.
    async fn load(&self) -> ZoracResult<Vec<Message>>;

    /// Human-readable location, for status messages
    fn location(&self) -> String;
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, messages: &[Message]) -> ZoracResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                ZoracError::persistence_at(
                    format!("Failed to create session directory: {}", e),
                    parent.display().to_string(),
                )
            })?;
        }

        let json = serde_json::to_string_pretty(messages)?;

        // Write beside the target, then rename over it
        let temp = self.temp_path();
        fs::write(&temp, json).await.map_err(|e| {
            ZoracError::persistence_at(
                format!("Failed to write session file: {}", e),
                temp.display().to_string(),
            )
        })?;
        fs::rename(&temp, &self.path).await.map_err(|e| {
            ZoracError::persistence_at(
                format!("Failed to replace session file: {}", e),
                self.display_path(),
            )
        })?;

        debug!("Saved {} messages to {:?}", messages.len(), self.path);
        Ok(())
    }

    async fn load(&self) -> ZoracResult<Vec<Message>> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ZoracError::session_not_found(self.display_path()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(ZoracError::session_corrupt(
                    format!("Session file is not valid UTF-8: {}", e),
                    self.display_path(),
                ));
            }
            Err(e) => {
                return Err(ZoracError::persistence_at(
                    format!("Failed to read session file: {}", e),
                    self.display_path(),
                ));
            }
        };

        let messages: Vec<Message> = serde_json::from_str(&json)
            .map_err(|e| ZoracError::session_corrupt(e.to_string(), self.display_path()))?;

        debug!("Loaded {} messages from {:?}", messages.len(), self.path);
        Ok(messages)
    }

    fn location(&self) -> String {
        self.display_path()
    }
}

/// In-memory session storage (for testing)
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<Vec<Message>>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a saved sequence
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            saved: Mutex::new(Some(messages)),
            ..Self::default()
        }
    }

    /// Storage whose every save fails with a persistence error
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the last saved sequence
    pub fn saved(&self) -> Option<Vec<Message>> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, messages: &[Message]) -> ZoracResult<()> {
        if self.fail_saves {
            return Err(ZoracError::persistence("memory store rejects writes"));
        }
        *self.saved.lock() = Some(messages.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> ZoracResult<Vec<Message>> {
        self.saved
            .lock()
            .clone()
            .ok_or_else(|| ZoracError::session_not_found("memory"))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
