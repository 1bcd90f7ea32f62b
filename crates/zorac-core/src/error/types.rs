//! Core error type for Zorac

use thiserror::Error;

/// Result type alias for Zorac operations
pub type ZoracResult<T> = Result<T, ZoracError>;

/// Main error type for Zorac
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoracError {
    /// The inference endpoint could not be reached
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        url: Option<String>,
    },

    /// The endpoint rejected the request or returned something unparseable
    #[error("Request error: {message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// Disk read or write failure
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        path: Option<String>,
    },

    /// The tokenizer encoding identifier is not known
    #[error("Unknown encoding: {encoding}")]
    UnknownEncoding { encoding: String },

    /// No stored session exists yet
    #[error("No saved session at {path}")]
    SessionNotFound { path: String },

    /// The stored session could not be parsed into messages
    #[error("Saved session is corrupt: {message}")]
    SessionCorrupt {
        message: String,
        path: Option<String>,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        key: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// The operation was cancelled by the user
    #[error("Operation was cancelled")]
    Cancelled,
}

impl ZoracError {
    /// Whether the chat session can carry on after this error.
    ///
    /// Only configuration errors are treated as fatal; everything else is
    /// reported and the prompt stays usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }

    /// Whether the endpoint itself was unreachable
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Whether this is a user cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short machine-friendly code, used in log fields
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Request { .. } => "request",
            Self::Persistence { .. } => "persistence",
            Self::UnknownEncoding { .. } => "unknown_encoding",
            Self::SessionNotFound { .. } => "session_not_found",
            Self::SessionCorrupt { .. } => "session_corrupt",
            Self::Config { .. } => "config",
            Self::Json { .. } => "json",
            Self::Cancelled => "cancelled",
        }
    }
}
