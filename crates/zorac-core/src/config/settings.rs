//! Resolved runtime settings

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::config::keys::{ConfigKey, parse_bool};
use crate::context::ContextSettings;
use crate::error::ZoracResult;
use crate::streaming::GenerationSettings;

/// Values given on the command line, highest priority
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub stream: Option<bool>,
}

/// Every setting the chat loop reads, typed
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_input_tokens: usize,
    pub max_output_tokens: u32,
    pub keep_recent_messages: usize,
    pub temperature: f32,
    pub stream: bool,
    pub encoding: String,
    pub code_theme: String,
    /// Whole-request limit for inference calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&BTreeMap::new(), |_| None, &Overrides::default())
    }
}

impl Settings {
    /// Resolve from the process environment, the config file entries and
    /// command-line overrides
    pub fn load(file: &BTreeMap<String, String>, overrides: &Overrides) -> Self {
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve with an explicit environment lookup. Empty environment values
    /// count as unset; invalid values fall back to the default with a warning.
    pub fn resolve(
        file: &BTreeMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Self {
        let raw = |key: ConfigKey| -> String {
            env(key.as_str())
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.get(key.as_str()).cloned())
                .unwrap_or_else(|| key.default_value().to_string())
        };

        let mut settings = Self {
            base_url: checked(ConfigKey::BaseUrl, &raw(ConfigKey::BaseUrl)),
            api_key: raw(ConfigKey::ApiKey),
            model: checked(ConfigKey::Model, &raw(ConfigKey::Model)),
            max_input_tokens: typed(ConfigKey::MaxInputTokens, &raw(ConfigKey::MaxInputTokens)),
            max_output_tokens: typed(ConfigKey::MaxOutputTokens, &raw(ConfigKey::MaxOutputTokens)),
            keep_recent_messages: typed(
                ConfigKey::KeepRecentMessages,
                &raw(ConfigKey::KeepRecentMessages),
            ),
            temperature: typed(ConfigKey::Temperature, &raw(ConfigKey::Temperature)),
            stream: parse_bool(&raw(ConfigKey::Stream)).unwrap_or_else(|| {
                warn!("Invalid boolean for STREAM, using default");
                true
            }),
            encoding: raw(ConfigKey::Encoding).trim().to_string(),
            code_theme: checked(ConfigKey::CodeTheme, &raw(ConfigKey::CodeTheme)),
            request_timeout_secs: typed(
                ConfigKey::RequestTimeout,
                &raw(ConfigKey::RequestTimeout),
            ),
        };

        if let Some(url) = &overrides.base_url {
            settings.base_url = checked(ConfigKey::BaseUrl, url);
        }
        if let Some(model) = &overrides.model {
            settings.model = checked(ConfigKey::Model, model);
        }
        if let Some(stream) = overrides.stream {
            settings.stream = stream;
        }
        settings
    }

    /// Apply a validated value at runtime after `/config set`
    pub fn apply(&mut self, key: ConfigKey, value: &str) -> ZoracResult<()> {
        let value = key.validate(value)?;
        match key {
            ConfigKey::BaseUrl => self.base_url = value,
            ConfigKey::ApiKey => self.api_key = value,
            ConfigKey::Model => self.model = value,
            ConfigKey::MaxInputTokens => self.max_input_tokens = typed(key, &value),
            ConfigKey::MaxOutputTokens => self.max_output_tokens = typed(key, &value),
            ConfigKey::KeepRecentMessages => self.keep_recent_messages = typed(key, &value),
            ConfigKey::Temperature => self.temperature = typed(key, &value),
            ConfigKey::Stream => self.stream = parse_bool(&value).unwrap_or(self.stream),
            ConfigKey::Encoding => self.encoding = value,
            ConfigKey::CodeTheme => self.code_theme = value,
            ConfigKey::RequestTimeout => self.request_timeout_secs = typed(key, &value),
        }
        Ok(())
    }

    /// Current value as text
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::BaseUrl => self.base_url.clone(),
            ConfigKey::ApiKey => self.api_key.clone(),
            ConfigKey::Model => self.model.clone(),
            ConfigKey::MaxInputTokens => self.max_input_tokens.to_string(),
            ConfigKey::MaxOutputTokens => self.max_output_tokens.to_string(),
            ConfigKey::KeepRecentMessages => self.keep_recent_messages.to_string(),
            ConfigKey::Temperature => self.temperature.to_string(),
            ConfigKey::Stream => self.stream.to_string(),
            ConfigKey::Encoding => self.encoding.clone(),
            ConfigKey::CodeTheme => self.code_theme.clone(),
            ConfigKey::RequestTimeout => self.request_timeout_secs.to_string(),
        }
    }

    /// Every key and value for display, with the API key masked
    pub fn list(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| {
                let value = match key {
                    ConfigKey::ApiKey => mask(&self.api_key),
                    _ => self.get(key),
                };
                (key, value)
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings {
            max_input_tokens: self.max_input_tokens,
            keep_recent_messages: self.keep_recent_messages,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            stream_enabled: self.stream,
        }
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}...", visible)
}

/// Validated text value, or the default with a warning
fn checked(key: ConfigKey, value: &str) -> String {
    key.validate(value).unwrap_or_else(|e| {
        warn!("{}, using default {}", e, key.default_value());
        key.default_value().to_string()
    })
}

/// Validated and parsed value, or the parsed default with a warning
fn typed<T: FromStr + Default>(key: ConfigKey, value: &str) -> T {
    checked(key, value)
        .parse()
        .or_else(|_| key.default_value().parse())
        .unwrap_or_default()
}
