//! Explicit client context for the persistence service.

use std::time::Duration;

use secrecy::SecretString;

use super::settings::CoreSettings;

/// Where and how to reach the persistence service
///
/// Built once from settings and handed to the HTTP store at construction.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Service base URL, without trailing slash
    pub base_url: String,
    /// REST prefix, e.g. `/api/v1`
    pub api_prefix: String,
    /// Bearer token sent on every request
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent
    pub user_agent: String,
}

impl ClientContext {
    /// Creates a context with default prefix and timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = CoreSettings::default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: defaults.api_prefix,
            token: None,
            timeout: Duration::from_secs(defaults.request_timeout_secs),
            user_agent: defaults.user_agent,
        }
    }

    /// Builds a context from settings
    #[must_use]
    pub fn from_settings(settings: &CoreSettings) -> Self {
        Self {
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_prefix: settings.api_prefix.trim_end_matches('/').to_string(),
            token: settings.api_token.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            user_agent: settings.user_agent.clone(),
        }
    }

    /// Sets the bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for a path under the API prefix
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }
}
