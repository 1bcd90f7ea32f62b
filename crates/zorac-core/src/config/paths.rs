use std::path::PathBuf;

/// Locations of Zorac's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoracPaths {
    pub dir: PathBuf,
    pub session_file: PathBuf,
    pub history_file: PathBuf,
    pub config_file: PathBuf,
}

impl ZoracPaths {
    /// Resolve from `ZORAC_*` environment variables, defaulting to `~/.zorac`
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let dir = var("ZORAC_DIR").unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".zorac")
        });

        Self {
            session_file: var("ZORAC_SESSION_FILE").unwrap_or_else(|| dir.join("session.json")),
            history_file: var("ZORAC_HISTORY_FILE").unwrap_or_else(|| dir.join("history")),
            config_file: var("ZORAC_CONFIG_FILE").unwrap_or_else(|| dir.join("config.json")),
            dir,
        }
    }
}
