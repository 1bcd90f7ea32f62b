//! From trait implementations for ZoracError conversions

use super::types::ZoracError;

impl From<std::io::Error> for ZoracError {
    fn from(error: std::io::Error) -> Self {
        Self::persistence(error.to_string())
    }
}

impl From<serde_json::Error> for ZoracError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<reqwest::Error> for ZoracError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string());

        if error.is_connect() || error.is_timeout() {
            return Self::Connection {
                message: error.to_string(),
                url,
            };
        }

        Self::Request {
            message: error.to_string(),
            status_code: error.status().map(|s| s.as_u16()),
        }
    }
}
