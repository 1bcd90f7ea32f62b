//! Constructor methods for ZoracError

use super::types::ZoracError;

impl ZoracError {
    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            url: None,
        }
    }

    /// Create a connection error for a specific URL
    pub fn connection_to(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            url: Some(url.into()),
        }
    }

    /// Create a new request error
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a request error carrying the HTTP status
    pub fn request_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Request {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            path: None,
        }
    }

    /// Create a persistence error for a specific path
    pub fn persistence_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create an unknown encoding error
    pub fn unknown_encoding(encoding: impl Into<String>) -> Self {
        Self::UnknownEncoding {
            encoding: encoding.into(),
        }
    }

    /// Create a session-not-found error
    pub fn session_not_found(path: impl Into<String>) -> Self {
        Self::SessionNotFound { path: path.into() }
    }

    /// Create a corrupt-session error
    pub fn session_corrupt(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::SessionCorrupt {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Create a configuration error for a specific key
    pub fn config_for_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_fill_optional_fields() {
        let err = ZoracError::request_with_status("context length exceeded", 400);
        assert_eq!(
            err,
            ZoracError::Request {
                message: "context length exceeded".to_string(),
                status_code: Some(400),
            }
        );

        let err = ZoracError::persistence_at("disk full", "/tmp/session.json");
        assert!(matches!(err, ZoracError::Persistence { path: Some(ref p), .. } if p == "/tmp/session.json"));
    }

    #[test]
    fn test_classifiers() {
        assert!(ZoracError::connection("refused").is_connection());
        assert!(ZoracError::connection("refused").is_recoverable());
        assert!(ZoracError::Cancelled.is_cancelled());
        assert!(!ZoracError::config("bad").is_recoverable());
        assert_eq!(ZoracError::unknown_encoding("nope").code(), "unknown_encoding");
    }

    #[test]
    fn test_display() {
        let err = ZoracError::unknown_encoding("klingon_base");
        assert_eq!(err.to_string(), "Unknown encoding: klingon_base");
    }
}
