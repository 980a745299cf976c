//! Save-time invariant checks.
//!
//! Every check here runs locally, before anything reaches the persistence
//! service or the network.

use reqwest::Url;

use super::connection::{Connection, ConnectionConfig, ConnectionFormData, ConnectionUpdate, HealthCheckConfig};
use super::credentials::Credentials;
use crate::error::ValidationError;

/// Upper bound on the per-attempt timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Upper bound on retries after the first attempt
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Upper bound on the delay between attempts in seconds
pub const MAX_RETRY_DELAY_SECS: u64 = 300;

/// Maximum length of a connection name
pub const MAX_NAME_LEN: usize = 255;

/// Validates input for a new connection
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_form(form: &ConnectionFormData) -> Result<(), ValidationError> {
    validate_name(&form.name)?;
    validate_provider(&form.provider)?;
    validate_config(&form.config)?;
    validate_health_check(&form.health_check)?;
    validate_credentials(&form.credentials)
}

/// Validates a complete connection record
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_connection(connection: &Connection) -> Result<(), ValidationError> {
    validate_name(&connection.name)?;
    validate_provider(&connection.provider)?;
    validate_config(&connection.config)?;
    validate_health_check(&connection.health_check)?;
    validate_credentials(&connection.credentials)
}

/// Validates only the fields present in a partial update
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_update(update: &ConnectionUpdate) -> Result<(), ValidationError> {
    if let Some(ref name) = update.name {
        validate_name(name)?;
    }
    if let Some(ref provider) = update.provider {
        validate_provider(provider)?;
    }
    if let Some(ref config) = update.config {
        validate_config(config)?;
    }
    if let Some(ref health_check) = update.health_check {
        validate_health_check(health_check)?;
    }
    if let Some(ref credentials) = update.credentials {
        validate_credentials(credentials)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing("name"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_provider(provider: &str) -> Result<(), ValidationError> {
    if provider.trim().is_empty() {
        return Err(ValidationError::missing("provider"));
    }
    Ok(())
}

/// Checks transport settings
///
/// # Errors
///
/// Returns an error for a malformed base URL or out-of-range timing values.
pub fn validate_config(config: &ConnectionConfig) -> Result<(), ValidationError> {
    validate_base_url(&config.base_url)?;

    if config.timeout == 0 {
        return Err(ValidationError::new("config.timeout", "must be greater than 0"));
    }
    if config.timeout > MAX_TIMEOUT_SECS {
        return Err(ValidationError::new(
            "config.timeout",
            format!("must be at most {MAX_TIMEOUT_SECS} seconds"),
        ));
    }
    if config.retry_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ValidationError::new(
            "config.retryAttempts",
            format!("must be at most {MAX_RETRY_ATTEMPTS}"),
        ));
    }
    if config.retry_delay > MAX_RETRY_DELAY_SECS {
        return Err(ValidationError::new(
            "config.retryDelay",
            format!("must be at most {MAX_RETRY_DELAY_SECS} seconds"),
        ));
    }
    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<(), ValidationError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing("config.baseUrl"));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| ValidationError::new("config.baseUrl", format!("malformed URL: {e}")))?;
    if !url.has_host() {
        return Err(ValidationError::new("config.baseUrl", "URL has no host"));
    }
    Ok(())
}

/// Checks health-check settings
///
/// # Errors
///
/// Returns an error for a zero interval or timeout, a malformed endpoint,
/// or an impossible expected status.
pub fn validate_health_check(health_check: &HealthCheckConfig) -> Result<(), ValidationError> {
    if health_check.interval == 0 {
        return Err(ValidationError::new(
            "healthCheck.interval",
            "must be at least 1 minute",
        ));
    }
    if health_check.timeout == 0 {
        return Err(ValidationError::new(
            "healthCheck.timeout",
            "must be greater than 0",
        ));
    }
    if health_check.timeout > MAX_TIMEOUT_SECS {
        return Err(ValidationError::new(
            "healthCheck.timeout",
            format!("must be at most {MAX_TIMEOUT_SECS} seconds"),
        ));
    }
    if let Some(ref endpoint) = health_check.endpoint {
        validate_endpoint(endpoint)?;
    }
    if let Some(status) = health_check.expected_status {
        if !(100..=599).contains(&status) {
            return Err(ValidationError::new(
                "healthCheck.expectedStatus",
                format!("{status} is not a valid HTTP status"),
            ));
        }
    }
    Ok(())
}

fn validate_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "healthCheck.endpoint",
            "must not be empty when set",
        ));
    }
    if trimmed.starts_with('/') {
        return Ok(());
    }
    Url::parse(trimmed)
        .map(|_| ())
        .map_err(|e| ValidationError::new("healthCheck.endpoint", format!("malformed URL: {e}")))
}

fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    credentials.validate()
}
