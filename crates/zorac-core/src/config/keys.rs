//! Known configuration keys, defaults and validation

use std::fmt;
use std::str::FromStr;

use crate::error::{ZoracError, ZoracResult};
use crate::tokens::TokenAccountant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    BaseUrl,
    ApiKey,
    Model,
    MaxInputTokens,
    MaxOutputTokens,
    KeepRecentMessages,
    Temperature,
    Stream,
    Encoding,
    CodeTheme,
    RequestTimeout,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 11] = [
        ConfigKey::BaseUrl,
        ConfigKey::ApiKey,
        ConfigKey::Model,
        ConfigKey::MaxInputTokens,
        ConfigKey::MaxOutputTokens,
        ConfigKey::KeepRecentMessages,
        ConfigKey::Temperature,
        ConfigKey::Stream,
        ConfigKey::Encoding,
        ConfigKey::CodeTheme,
        ConfigKey::RequestTimeout,
    ];

    /// Name used in the environment and the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "VLLM_BASE_URL",
            ConfigKey::ApiKey => "VLLM_API_KEY",
            ConfigKey::Model => "VLLM_MODEL",
            ConfigKey::MaxInputTokens => "MAX_INPUT_TOKENS",
            ConfigKey::MaxOutputTokens => "MAX_OUTPUT_TOKENS",
            ConfigKey::KeepRecentMessages => "KEEP_RECENT_MESSAGES",
            ConfigKey::Temperature => "TEMPERATURE",
            ConfigKey::Stream => "STREAM",
            ConfigKey::Encoding => "TIKTOKEN_ENCODING",
            ConfigKey::CodeTheme => "CODE_THEME",
            ConfigKey::RequestTimeout => "REQUEST_TIMEOUT",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "http://localhost:8000/v1",
            ConfigKey::ApiKey => "EMPTY",
            ConfigKey::Model => "stelterlab/Mistral-Small-24B-Instruct-2501-AWQ",
            ConfigKey::MaxInputTokens => "12000",
            ConfigKey::MaxOutputTokens => "4000",
            ConfigKey::KeepRecentMessages => "6",
            ConfigKey::Temperature => "0.1",
            ConfigKey::Stream => "true",
            ConfigKey::Encoding => "cl100k_base",
            ConfigKey::CodeTheme => "base16-ocean.dark",
            ConfigKey::RequestTimeout => "300",
        }
    }

    /// Comma-separated list of every key, for error messages
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check `value` for this key and return its normalised form
    pub fn validate(&self, value: &str) -> ZoracResult<String> {
        let value = value.trim();
        let invalid = |what: &str| {
            ZoracError::config_for_key(format!("Invalid {}: {}", what, value), self.as_str())
        };

        match self {
            ConfigKey::BaseUrl => {
                let url = value.trim_end_matches('/');
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(url.to_string())
                } else {
                    Err(invalid("base URL (expected http:// or https://)"))
                }
            }
            ConfigKey::ApiKey | ConfigKey::Model | ConfigKey::CodeTheme => {
                if value.is_empty() {
                    Err(invalid("empty value"))
                } else {
                    Ok(value.to_string())
                }
            }
            ConfigKey::MaxInputTokens | ConfigKey::MaxOutputTokens => match value.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n.to_string()),
                _ => Err(invalid("token count")),
            },
            ConfigKey::KeepRecentMessages => value
                .parse::<u32>()
                .map(|n| n.to_string())
                .map_err(|_| invalid("message count")),
            ConfigKey::Temperature => match value.parse::<f32>() {
                Ok(t) if (0.0..=2.0).contains(&t) => Ok(value.to_string()),
                _ => Err(invalid("temperature (expected 0.0 to 2.0)")),
            },
            ConfigKey::Stream => parse_bool(value)
                .map(|b| b.to_string())
                .ok_or_else(|| invalid("boolean")),
            ConfigKey::Encoding => TokenAccountant::new(value)
                .map(|_| value.to_string())
                .map_err(|_| invalid("tiktoken encoding")),
            ConfigKey::RequestTimeout => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(secs.to_string()),
                _ => Err(invalid("timeout in seconds")),
            },
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ZoracError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == upper)
            .ok_or_else(|| {
                ZoracError::config(format!(
                    "Unknown setting: {}. Available keys: {}",
                    upper,
                    Self::names()
                ))
            })
    }
}

/// Lenient boolean: true/1/yes/on and false/0/no/off, case-insensitive
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
