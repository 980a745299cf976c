//! Persisted core settings.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::health::DEFAULT_CONCURRENCY;
use crate::history::DEFAULT_HISTORY_LIMIT;

/// Default persistence service URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Default REST prefix
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Default timeout for persistence requests in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for the core library and its consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// Base URL of the persistence service
    pub api_base_url: String,
    /// Path prefix of the REST API
    pub api_prefix: String,
    /// Timeout for persistence requests in seconds
    pub request_timeout_secs: u64,
    /// Bearer token for the persistence service
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_token",
        deserialize_with = "deserialize_token"
    )]
    pub api_token: Option<SecretString>,
    /// Maximum simultaneous tests in a bulk run
    pub bulk_concurrency: usize,
    /// Results kept per connection
    pub history_limit: usize,
    /// User agent for outgoing requests
    pub user_agent: String,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            api_token: None,
            bulk_concurrency: DEFAULT_CONCURRENCY,
            history_limit: DEFAULT_HISTORY_LIMIT,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("connhub/{}", env!("CARGO_PKG_VERSION"))
}

#[allow(clippy::ref_option)]
fn serialize_token<S: serde::Serializer>(
    token: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use secrecy::ExposeSecret;
    match token {
        Some(t) => serializer.serialize_some(t.expose_secret()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_token<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Option::<String>::deserialize(deserializer)
        .map(|o| o.filter(|s| !s.is_empty()).map(SecretString::from))
}

impl CoreSettings {
    /// Parses settings from TOML
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is invalid.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let settings: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Checks value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first bad setting.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bulk_concurrency == 0 {
            return Err(invalid("bulk_concurrency", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than 0"));
        }
        if self.history_limit == 0 {
            return Err(invalid("history_limit", "must be at least 1"));
        }
        let url = reqwest::Url::parse(&self.api_base_url)
            .map_err(|e| invalid("api_base_url", &format!("malformed URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("api_base_url", "must use http or https"));
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must start with '/'"));
        }
        Ok(())
    }

    /// Sets the service URL
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the bearer token
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
