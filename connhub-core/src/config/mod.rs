//! Configuration management for `ConnHub`
//!
//! `CoreSettings` are stored as TOML in the configuration directory and
//! turned into an explicit [`ClientContext`] for the persistence service.

mod context;
mod manager;
mod settings;

pub use context::ClientContext;
pub use manager::{API_TOKEN_ENV, API_URL_ENV, CONFIG_DIR_ENV, ConfigManager, SETTINGS_FILE};
pub use settings::{
    CoreSettings, DEFAULT_API_BASE_URL, DEFAULT_API_PREFIX, DEFAULT_REQUEST_TIMEOUT_SECS,
};
