//! Builds the provider-agnostic probe request for a connection and
//! classifies the status it gets back.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::transport::{ProbeError, ProbeRequest};
use crate::models::{ApiKeyLocation, Connection, Credentials, HealthCheckConfig, HttpMethod};

/// Why a test is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// User-triggered test bounded by `config.timeout`
    #[default]
    OnDemand,
    /// Scheduled check bounded by `healthCheck.timeout`
    HealthCheck,
}

impl TestMode {
    /// Per-attempt timeout for `connection` in this mode
    #[must_use]
    pub const fn timeout(self, connection: &Connection) -> Duration {
        match self {
            Self::OnDemand => Duration::from_secs(connection.config.timeout),
            Self::HealthCheck => Duration::from_secs(connection.health_check.timeout),
        }
    }

    /// Returns the mode name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnDemand => "on_demand",
            Self::HealthCheck => "health_check",
        }
    }
}

impl std::fmt::Display for TestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-off replacement of the target and method for a single test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOverrides {
    /// Endpoint override: absolute URL or path relative to the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Method override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
}

impl TestOverrides {
    /// Returns true if nothing is overridden
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.endpoint.is_none() && self.method.is_none()
    }
}

/// Resolves the target URL for a test
///
/// The override endpoint wins over `healthCheck.endpoint`, which wins over
/// `config.baseUrl`. Paths starting with `/` are joined to the base URL.
#[must_use]
pub fn resolve_target(connection: &Connection, overrides: &TestOverrides) -> String {
    let base = connection.config.base_url.trim();
    let endpoint = overrides
        .endpoint
        .as_deref()
        .or(connection.health_check.endpoint.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty());

    match endpoint {
        None => base.to_string(),
        Some(path) if path.starts_with('/') => {
            format!("{}{}", base.trim_end_matches('/'), path)
        }
        Some(url) => url.to_string(),
    }
}

/// Builds the probe request for `connection`
///
/// Credentials are injected according to their kind. OAuth 1.0a and
/// certificate credentials add nothing here; they need a transport that
/// understands them.
#[must_use]
pub fn build_request(connection: &Connection, overrides: &TestOverrides) -> ProbeRequest {
    let method = overrides.method.unwrap_or(connection.health_check.method);
    let mut request = ProbeRequest::new(resolve_target(connection, overrides), method);

    match &connection.credentials {
        Credentials::None | Credentials::OAuth1 { .. } | Credentials::Certificate { .. } => {}
        Credentials::ApiKey {
            key,
            name,
            location,
        } => match location {
            ApiKeyLocation::Header => {
                request.headers.insert(name.clone(), key.clone());
            }
            ApiKeyLocation::Query => request.query.push((name.clone(), key.clone())),
        },
        Credentials::BearerToken { token } | Credentials::Jwt { token } => {
            request.headers.insert(
                "Authorization".to_string(),
                SecretString::from(format!("Bearer {}", token.expose_secret())),
            );
        }
        Credentials::BasicAuth { username, password } => {
            request.basic_auth = Some((username.clone(), password.clone()));
        }
        Credentials::OAuth2 {
            access_token,
            token_type,
            ..
        } => {
            request.headers.insert(
                "Authorization".to_string(),
                SecretString::from(format!("{token_type} {}", access_token.expose_secret())),
            );
        }
        Credentials::CustomHeader { headers } => {
            for (name, value) in headers {
                request
                    .headers
                    .insert(name.clone(), SecretString::from(value.clone()));
            }
        }
    }

    request
}

/// Classifies a received status against the health-check expectation
///
/// # Errors
///
/// Returns `ServerError` for 5xx, `AuthRejected` for 401/403, `ClientError`
/// for other 4xx and `UnexpectedStatus` for any other mismatch. An
/// explicitly expected status always passes, even if it is a 4xx or 5xx.
pub fn classify_status(health_check: &HealthCheckConfig, status: u16) -> Result<(), ProbeError> {
    if health_check.accepts_status(status) {
        return Ok(());
    }
    match status {
        500..=599 => Err(ProbeError::ServerError(status)),
        401 | 403 => Err(ProbeError::AuthRejected(status)),
        400..=499 => Err(ProbeError::ClientError(status)),
        _ => Err(ProbeError::UnexpectedStatus {
            expected: health_check
                .expected_status
                .map_or_else(|| "2xx".to_string(), |s| s.to_string()),
            actual: status,
        }),
    }
}
