//! Persistent input history
//!
//! One entry per line; newlines inside an entry are stored as `\n` and
//! backslashes as `\\`. Reading or writing the file never fails the caller.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_ENTRIES: usize = 500;

pub struct InputHistory {
    path: PathBuf,
    entries: Vec<String>,
}

impl InputHistory {
    /// Load the history file; a missing or unreadable file gives an empty history
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => text
                .lines()
                .filter(|l| !l.is_empty())
                .map(unescape)
                .collect(),
            Err(e) => {
                debug!("No input history at {:?}: {}", path, e);
                Vec::new()
            }
        };
        let mut history = Self { path, entries };
        history.truncate();
        history
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record an entry; blank input and repeats of the previous entry are skipped
    pub fn push(&mut self, entry: &str) {
        if entry.trim().is_empty() || self.entries.last().is_some_and(|last| last == entry) {
            return;
        }
        self.entries.push(entry.to_string());
        self.truncate();
    }

    pub fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                debug!("Cannot create history directory: {}", e);
                return;
            }
        }
        let mut text = self
            .entries
            .iter()
            .map(|e| escape(e))
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        if let Err(e) = fs::write(&self.path, text) {
            debug!("Failed to write input history: {}", e);
        }
    }

    fn truncate(&mut self) {
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }
}

fn escape(entry: &str) -> String {
    entry.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
