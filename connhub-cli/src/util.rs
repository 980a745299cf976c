//! Shared utility functions used across command modules.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use connhub_core::config::{ClientContext, ConfigManager, CoreSettings};
use connhub_core::models::{ApiKeyLocation, Credentials, DEFAULT_API_KEY_HEADER};
use connhub_core::store::HttpConnectionStore;
use connhub_core::testing::ConnectionTester;
use connhub_core::ConnectionRegistry;
use tracing::debug;

use crate::cli::{AuthArg, AuthArgs};
use crate::error::CliError;

/// Global options every command needs to reach the persistence service
pub struct GlobalOptions<'a> {
    /// Custom configuration directory
    pub config_path: Option<&'a Path>,
    /// Persistence service URL override
    pub api_url: Option<&'a str>,
    /// Persistence token override
    pub token: Option<&'a str>,
}

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings and applies environment and flag overrides
pub fn load_settings(options: &GlobalOptions<'_>) -> Result<CoreSettings, CliError> {
    let mut settings = create_config_manager(options.config_path)?.load_settings_with_env()?;
    if let Some(url) = options.api_url {
        settings = settings.with_api_base_url(url);
    }
    if let Some(token) = options.token {
        settings = settings.with_api_token(token);
    }
    settings.validate()?;
    Ok(settings)
}

/// Builds a registry backed by the persistence service
pub fn create_registry(options: &GlobalOptions<'_>) -> Result<ConnectionRegistry, CliError> {
    let settings = load_settings(options)?;
    let context = ClientContext::from_settings(&settings);
    debug!(endpoint = %context.endpoint("/connections"), "Using persistence service");

    let store = HttpConnectionStore::new(context).map_err(|e| CliError::Store(e.to_string()))?;
    let tester = ConnectionTester::http(&settings.user_agent)
        .map_err(|e| CliError::Config(format!("Failed to initialize HTTP client: {e}")))?;

    Ok(ConnectionRegistry::new(Arc::new(store), tester)
        .with_concurrency(settings.bulk_concurrency)
        .with_history_limit(settings.history_limit))
}

/// Runs a future to completion on a fresh runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Config(format!("Failed to create async runtime: {e}")))?;
    Ok(runtime.block_on(future))
}

/// Builds credentials from `--auth` and its companion flags
///
/// Returns `None` when `--auth` was not given.
pub fn credentials_from_args(args: &AuthArgs) -> Result<Option<Credentials>, CliError> {
    let Some(kind) = args.auth else {
        return Ok(None);
    };
    let required = |value: &Option<String>, flag: &str| {
        value
            .clone()
            .ok_or_else(|| CliError::Validation(format!("--{flag} is required for --auth")))
    };

    let credentials = match kind {
        AuthArg::None => Credentials::None,
        AuthArg::ApiKey => Credentials::ApiKey {
            key: required(&args.api_key, "api-key")?.into(),
            name: args
                .api_key_name
                .clone()
                .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            location: if args.api_key_in_query {
                ApiKeyLocation::Query
            } else {
                ApiKeyLocation::Header
            },
        },
        AuthArg::Bearer => Credentials::bearer(required(&args.auth_token, "auth-token")?),
        AuthArg::Jwt => Credentials::Jwt {
            token: required(&args.auth_token, "auth-token")?.into(),
        },
        AuthArg::Basic => Credentials::basic(
            required(&args.username, "username")?,
            required(&args.password, "password")?,
        ),
    };
    Ok(Some(credentials))
}

/// Truncates `text` to `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
