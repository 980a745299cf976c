//! Connection model and its configuration blocks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credentials::Credentials;
use super::template::ConnectionTemplate;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after the first attempt
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default delay between attempts in seconds
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;

/// Default health-check interval in minutes
pub const DEFAULT_HEALTH_INTERVAL_MINUTES: u32 = 5;

/// Default health-check timeout in seconds
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 10;

/// Kind of external service a connection integrates with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// REST or RPC API
    Api,
    /// Database server
    Database,
    /// Webhook endpoint
    Webhook,
    /// OAuth provider
    #[serde(rename = "oauth")]
    OAuth,
    /// File or object storage
    FileStorage,
    /// Messaging / chat service
    Messaging,
    /// Analytics platform
    Analytics,
    /// Payment processor
    Payment,
    /// Email delivery
    Email,
    /// SMS gateway
    Sms,
    /// Social network
    SocialMedia,
    /// Customer relationship management
    Crm,
    /// Enterprise resource planning
    Erp,
    /// Anything else
    Custom,
}

impl ConnectionType {
    /// Every connection type, in declaration order
    pub const ALL: [Self; 14] = [
        Self::Api,
        Self::Database,
        Self::Webhook,
        Self::OAuth,
        Self::FileStorage,
        Self::Messaging,
        Self::Analytics,
        Self::Payment,
        Self::Email,
        Self::Sms,
        Self::SocialMedia,
        Self::Crm,
        Self::Erp,
        Self::Custom,
    ];

    /// Returns the wire name of this type
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Database => "database",
            Self::Webhook => "webhook",
            Self::OAuth => "oauth",
            Self::FileStorage => "file_storage",
            Self::Messaging => "messaging",
            Self::Analytics => "analytics",
            Self::Payment => "payment",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::SocialMedia => "social_media",
            Self::Crm => "crm",
            Self::Erp => "erp",
            Self::Custom => "custom",
        }
    }

    /// Returns the icon key used by front-ends for this type
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Api => "globe",
            Self::Database => "database",
            Self::Webhook => "webhook",
            Self::OAuth => "key",
            Self::FileStorage => "folder",
            Self::Messaging => "message-square",
            Self::Analytics => "bar-chart",
            Self::Payment => "credit-card",
            Self::Email => "mail",
            Self::Sms => "smartphone",
            Self::SocialMedia => "share-2",
            Self::Crm => "users",
            Self::Erp => "building",
            Self::Custom => "settings",
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown connection type '{s}'"))
    }
}

/// Lifecycle status of a connection
///
/// Only the state machine in [`crate::state`] moves a connection between
/// these values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Created or reactivated, not yet tested
    #[default]
    Pending,
    /// A test is in flight
    Testing,
    /// Last test succeeded
    Active,
    /// Administratively disabled
    Inactive,
    /// Last test failed
    Error,
}

impl ConnectionStatus {
    /// Every status, in declaration order
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Testing,
        Self::Active,
        Self::Inactive,
        Self::Error,
    ];

    /// Returns the wire name of this status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Testing => "testing",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Error => "error",
        }
    }

    /// Returns the display label for this status
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Testing => "Testing",
            Self::Active => "Connected",
            Self::Inactive => "Disabled",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == normalized)
            .ok_or_else(|| format!("unknown connection status '{s}'"))
    }
}

/// HTTP method used by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Returns the method token
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(format!("unknown HTTP method '{s}'")),
        }
    }
}

/// Transport settings for a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Per-attempt timeout in seconds (must be > 0)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Retries after the first attempt
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay between attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    /// Provider-specific settings, opaque to the core
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_json::Value>,
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

const fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

impl ConnectionConfig {
    /// Creates a config with default timeout and retry settings
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            settings: BTreeMap::new(),
        }
    }

    /// Sets the per-attempt timeout
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    /// Sets the retry count and delay
    #[must_use]
    pub const fn with_retries(mut self, attempts: u32, delay_secs: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay_secs;
        self
    }

    /// Adds a provider-specific setting
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }
}

/// Scheduled health-check settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckConfig {
    /// Whether scheduled checks run for this connection
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes between checks (>= 1)
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Endpoint override: absolute URL or path relative to the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Request method
    #[serde(default)]
    pub method: HttpMethod,
    /// Exact status expected; any 2xx when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
    /// Per-attempt timeout in seconds for scheduled checks
    #[serde(default = "default_health_timeout")]
    pub timeout: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_interval() -> u32 {
    DEFAULT_HEALTH_INTERVAL_MINUTES
}

const fn default_health_timeout() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_SECS
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_HEALTH_INTERVAL_MINUTES,
            endpoint: None,
            method: HttpMethod::Get,
            expected_status: None,
            timeout: DEFAULT_HEALTH_TIMEOUT_SECS,
        }
    }
}

impl HealthCheckConfig {
    /// Returns true if `status` counts as healthy for this check
    #[must_use]
    pub fn accepts_status(&self, status: u16) -> bool {
        match self.expected_status {
            Some(expected) => status == expected,
            None => (200..300).contains(&status),
        }
    }
}

/// A configured integration to an external service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Stable identity
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Service kind
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Vendor key (free text, e.g. `stripe`)
    pub provider: String,
    /// Transport settings
    pub config: ConnectionConfig,
    /// Pre-resolved credentials
    #[serde(default)]
    pub credentials: Credentials,
    /// Scheduled health-check settings
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    /// Lifecycle status
    #[serde(default)]
    pub status: ConnectionStatus,
    /// Tags (no duplicates)
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Free-text category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Administrative on/off switch
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Failed tests applied to this connection
    #[serde(default)]
    pub error_count: u64,
    /// Successful tests applied to this connection
    #[serde(default)]
    pub success_count: u64,
    /// When the last successful test completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    /// When the last test result was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tested: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Creates a new pending connection with default settings
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection_type: ConnectionType,
        provider: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            connection_type,
            provider: provider.into(),
            config: ConnectionConfig::new(base_url),
            credentials: Credentials::None,
            health_check: HealthCheckConfig::default(),
            status: ConnectionStatus::Pending,
            tags: BTreeSet::new(),
            category: None,
            is_active: true,
            error_count: 0,
            success_count: 0,
            last_connected: None,
            last_tested: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Updates the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns true if a scheduled health check should run at `now`
    ///
    /// Disabled checks and inactive connections are never due. A connection
    /// that has never been tested is always due. The stored status is not
    /// consulted; callers exclude tests that are actually in flight.
    #[must_use]
    pub fn due_for_health_check(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active || !self.health_check.enabled {
            return false;
        }
        match self.last_tested {
            None => true,
            Some(last) => {
                now.signed_duration_since(last)
                    >= Duration::minutes(i64::from(self.health_check.interval.max(1)))
            }
        }
    }

    /// Returns true if the connection was connected within `window` of `now`
    #[must_use]
    pub fn connected_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.last_connected.is_some_and(|at| {
            let age = now.signed_duration_since(at);
            age >= Duration::zero() && age <= window
        })
    }
}

/// User input for creating a connection
///
/// Carries no status, counters or timestamps; those are owned by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionFormData {
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Service kind
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Vendor key
    pub provider: String,
    /// Transport settings
    pub config: ConnectionConfig,
    /// Credentials
    #[serde(default)]
    pub credentials: Credentials,
    /// Health-check settings
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    /// Tags; duplicates are collapsed on create
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Initial administrative state
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ConnectionFormData {
    /// Creates form data with default settings
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection_type: ConnectionType,
        provider: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            connection_type,
            provider: provider.into(),
            config: ConnectionConfig::new(base_url),
            credentials: Credentials::None,
            health_check: HealthCheckConfig::default(),
            tags: Vec::new(),
            category: None,
            is_active: true,
        }
    }

    /// Pre-fills form data from a template
    ///
    /// The template is only read; the resulting connection never shares
    /// identity with it.
    #[must_use]
    pub fn from_template(template: &ConnectionTemplate, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(template.description.clone()),
            connection_type: template.connection_type,
            provider: template.provider.clone(),
            config: template.default_config.clone(),
            credentials: Credentials::None,
            health_check: template.default_health_check.clone(),
            tags: template.tags.clone(),
            category: Some(template.category.clone()),
            is_active: true,
        }
    }

    /// Sets the credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the transport settings
    #[must_use]
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the health-check settings
    #[must_use]
    pub fn with_health_check(mut self, health_check: HealthCheckConfig) -> Self {
        self.health_check = health_check;
        self
    }

    /// Adds a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the initial administrative state
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Builds a new connection from this input
    ///
    /// Active input starts `pending`, inactive input starts `inactive`.
    #[must_use]
    pub fn into_connection(self) -> Connection {
        let now = Utc::now();
        let status = if self.is_active {
            ConnectionStatus::Pending
        } else {
            ConnectionStatus::Inactive
        };
        Connection {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            connection_type: self.connection_type,
            provider: self.provider.trim().to_string(),
            config: self.config,
            credentials: self.credentials,
            health_check: self.health_check,
            status,
            tags: normalize_tags(self.tags),
            category: self.category,
            is_active: self.is_active,
            error_count: 0,
            success_count: 0,
            last_connected: None,
            last_tested: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a connection's user-editable fields
///
/// `is_active` is applied through the state machine by the registry, not
/// by [`ConnectionUpdate::apply_to`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
    /// New provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Replacement transport settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConnectionConfig>,
    /// Replacement credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// Replacement health-check settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckConfig>,
    /// Replacement tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// New category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New administrative state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ConnectionUpdate {
    /// Returns true if no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.connection_type.is_none()
            && self.provider.is_none()
            && self.config.is_none()
            && self.credentials.is_none()
            && self.health_check.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.is_active.is_none()
    }

    /// Applies the user-editable fields to `connection`
    ///
    /// Status, counters and `is_active` are left untouched.
    pub fn apply_to(&self, connection: &mut Connection) {
        if let Some(ref name) = self.name {
            connection.name = name.trim().to_string();
        }
        if let Some(ref description) = self.description {
            connection.description = Some(description.clone());
        }
        if let Some(connection_type) = self.connection_type {
            connection.connection_type = connection_type;
        }
        if let Some(ref provider) = self.provider {
            connection.provider = provider.trim().to_string();
        }
        if let Some(ref config) = self.config {
            connection.config = config.clone();
        }
        if let Some(ref credentials) = self.credentials {
            connection.credentials = credentials.clone();
        }
        if let Some(ref health_check) = self.health_check {
            connection.health_check = health_check.clone();
        }
        if let Some(ref tags) = self.tags {
            connection.tags = normalize_tags(tags.clone());
        }
        if let Some(ref category) = self.category {
            connection.category = Some(category.clone());
        }
        connection.touch();
    }
}

/// Trims tags, drops empty ones and collapses duplicates
fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
