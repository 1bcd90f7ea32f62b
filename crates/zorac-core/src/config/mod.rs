//! Configuration management
//!
//! Every setting resolves as CLI flag > environment variable > config file >
//! default. The config file is a flat JSON object of string values stored in
//! the Zorac directory next to the session and input history.

mod keys;
mod paths;
mod persistence;
mod settings;

pub use keys::{ConfigKey, parse_bool};
pub use paths::ZoracPaths;
pub use persistence::ConfigStore;
pub use settings::{Overrides, Settings};
