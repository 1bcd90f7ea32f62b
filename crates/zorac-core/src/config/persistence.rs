//! Config file persistence

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::keys::ConfigKey;
use crate::error::{ZoracError, ZoracResult};

/// Reads and writes the flat JSON config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a config file has been written yet (first-run detection)
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every entry. A missing file is empty; non-string values are
    /// kept in their JSON text form.
    pub fn load(&self) -> ZoracResult<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ZoracError::persistence_at(
                    format!("Failed to read config file: {}", e),
                    self.path.display().to_string(),
                ));
            }
        };

        let object: Map<String, Value> = serde_json::from_str(&raw).map_err(|e| {
            ZoracError::config(format!(
                "Config file {} is not a JSON object: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(object
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect())
    }

    /// Write every entry, replacing the file
    pub fn save(&self, entries: &BTreeMap<String, String>) -> ZoracResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json).map_err(|e| {
            ZoracError::persistence_at(
                format!("Failed to write config file: {}", e),
                self.path.display().to_string(),
            )
        })?;
        debug!("Saved {} config entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Stored value for `key`, if any
    pub fn get(&self, key: ConfigKey) -> ZoracResult<Option<String>> {
        Ok(self.load()?.remove(key.as_str()))
    }

    /// Validate and persist one value, keeping other entries. Returns the
    /// normalised value that was written.
    pub fn set(&self, key: ConfigKey, value: &str) -> ZoracResult<String> {
        let value = key.validate(value)?;
        let mut entries = self.load()?;
        entries.insert(key.as_str().to_string(), value.clone());
        self.save(&entries)?;
        Ok(value)
    }

    /// Write a complete config: every key at its default except `overrides`
    pub fn write_defaults(&self, overrides: &[(ConfigKey, String)]) -> ZoracResult<()> {
        let mut entries: BTreeMap<String, String> = ConfigKey::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), k.default_value().to_string()))
            .collect();
        for (key, value) in overrides {
            entries.insert(key.as_str().to_string(), key.validate(value)?);
        }
        self.save(&entries)
    }
}
