//! Read-only connection template model.

use serde::{Deserialize, Serialize};

use super::connection::{ConnectionConfig, ConnectionType, HealthCheckConfig};
use super::credentials::AuthKind;

/// Seed data used to pre-fill a new connection
///
/// Templates are never mutated and never share identity with a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTemplate {
    /// Stable slug (e.g. `stripe`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Service kind
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Vendor key
    pub provider: String,
    /// Category label
    pub category: String,
    /// Suggested authentication kind
    pub auth_kind: AuthKind,
    /// Default transport settings
    pub default_config: ConnectionConfig,
    /// Default health-check settings
    pub default_health_check: HealthCheckConfig,
    /// Setup steps shown to the user
    #[serde(default)]
    pub setup_instructions: Vec<String>,
    /// Featured in the catalog
    #[serde(default)]
    pub is_popular: bool,
    /// Maintained by the vendor
    #[serde(default)]
    pub is_official: bool,
    /// Tags copied onto new connections
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ConnectionTemplate {
    /// Returns true if the template matches a case-insensitive search term
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.provider.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}
