//! Built-in connection template catalog
//!
//! Templates are static seed data. Listing them never mutates anything, so
//! two calls always return identical data.

use std::sync::LazyLock;

use crate::models::{
    AuthKind, ConnectionConfig, ConnectionTemplate, ConnectionType, HealthCheckConfig, HttpMethod,
};

static CATALOG: LazyLock<Vec<ConnectionTemplate>> = LazyLock::new(build_catalog);

/// Every built-in template, popular ones first
#[must_use]
pub fn list_templates() -> Vec<ConnectionTemplate> {
    CATALOG.clone()
}

/// Looks up a template by id (case-insensitive)
#[must_use]
pub fn find_template(id: &str) -> Option<ConnectionTemplate> {
    CATALOG
        .iter()
        .find(|t| t.id.eq_ignore_ascii_case(id.trim()))
        .cloned()
}

/// Templates matching a search term
#[must_use]
pub fn search_templates(term: &str) -> Vec<ConnectionTemplate> {
    CATALOG
        .iter()
        .filter(|t| t.matches_search(term))
        .cloned()
        .collect()
}

/// Templates of one connection type
#[must_use]
pub fn templates_by_type(connection_type: ConnectionType) -> Vec<ConnectionTemplate> {
    CATALOG
        .iter()
        .filter(|t| t.connection_type == connection_type)
        .cloned()
        .collect()
}

struct Seed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    connection_type: ConnectionType,
    provider: &'static str,
    category: &'static str,
    auth_kind: AuthKind,
    base_url: &'static str,
    health_endpoint: Option<&'static str>,
    steps: &'static [&'static str],
    popular: bool,
    tags: &'static [&'static str],
}

impl Seed {
    fn into_template(self) -> ConnectionTemplate {
        ConnectionTemplate {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            connection_type: self.connection_type,
            provider: self.provider.to_string(),
            category: self.category.to_string(),
            auth_kind: self.auth_kind,
            default_config: ConnectionConfig::new(self.base_url),
            default_health_check: HealthCheckConfig {
                endpoint: self.health_endpoint.map(str::to_string),
                method: HttpMethod::Get,
                ..HealthCheckConfig::default()
            },
            setup_instructions: self.steps.iter().map(|s| (*s).to_string()).collect(),
            is_popular: self.popular,
            is_official: true,
            tags: self.tags.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

fn build_catalog() -> Vec<ConnectionTemplate> {
    let seeds = [
        Seed {
            id: "google-drive",
            name: "Google Drive",
            description: "Analyze your Google Drive files and folders",
            connection_type: ConnectionType::FileStorage,
            provider: "google",
            category: "Integration",
            auth_kind: AuthKind::OAuth2,
            base_url: "https://www.googleapis.com/drive/v3",
            health_endpoint: Some("/about?fields=user"),
            steps: &[
                "Create an OAuth client in the Google Cloud console",
                "Enable the Drive API for the project",
                "Authorize access and paste the resulting access token",
            ],
            popular: true,
            tags: &["files", "storage", "google"],
        },
        Seed {
            id: "stripe",
            name: "Stripe",
            description: "Track revenue, subscriptions, and refunds with clean Stripe analytics",
            connection_type: ConnectionType::Payment,
            provider: "stripe",
            category: "Payment",
            auth_kind: AuthKind::BearerToken,
            base_url: "https://api.stripe.com/v1",
            health_endpoint: Some("/balance"),
            steps: &[
                "Open Developers > API keys in the Stripe dashboard",
                "Create a restricted key with read access",
            ],
            popular: true,
            tags: &["payment", "revenue", "stripe"],
        },
        Seed {
            id: "notion",
            name: "Notion",
            description: "Read, update, and organize Notion pages programmatically",
            connection_type: ConnectionType::FileStorage,
            provider: "notion",
            category: "Productivity",
            auth_kind: AuthKind::BearerToken,
            base_url: "https://api.notion.com/v1",
            health_endpoint: Some("/users/me"),
            steps: &[
                "Create an internal integration at notion.so/my-integrations",
                "Share the pages you want to read with the integration",
            ],
            popular: true,
            tags: &["notes", "productivity", "notion"],
        },
        Seed {
            id: "github",
            name: "GitHub",
            description: "Search repositories, issues, and pull requests with actionable summaries",
            connection_type: ConnectionType::Api,
            provider: "github",
            category: "Development",
            auth_kind: AuthKind::BearerToken,
            base_url: "https://api.github.com",
            health_endpoint: Some("/user"),
            steps: &["Create a fine-grained personal access token"],
            popular: true,
            tags: &["code", "git", "github"],
        },
        Seed {
            id: "postgres",
            name: "PostgreSQL",
            description: "Connect to PostgreSQL database",
            connection_type: ConnectionType::Database,
            provider: "postgresql",
            category: "Database",
            auth_kind: AuthKind::BasicAuth,
            base_url: "postgresql://localhost:5432/postgres",
            health_endpoint: None,
            steps: &[
                "Create a read-only database role",
                "Allow connections from this host in pg_hba.conf",
            ],
            popular: true,
            tags: &["database", "sql", "postgres"],
        },
        Seed {
            id: "slack",
            name: "Slack",
            description: "Post messages and read channel history",
            connection_type: ConnectionType::Messaging,
            provider: "slack",
            category: "Communication",
            auth_kind: AuthKind::BearerToken,
            base_url: "https://slack.com/api",
            health_endpoint: Some("/auth.test"),
            steps: &["Install a Slack app to the workspace and copy its bot token"],
            popular: false,
            tags: &["chat", "messaging", "slack"],
        },
        Seed {
            id: "sendgrid",
            name: "SendGrid",
            description: "Send transactional email",
            connection_type: ConnectionType::Email,
            provider: "sendgrid",
            category: "Communication",
            auth_kind: AuthKind::BearerToken,
            base_url: "https://api.sendgrid.com/v3",
            health_endpoint: Some("/scopes"),
            steps: &["Create an API key under Settings > API Keys"],
            popular: false,
            tags: &["email", "sendgrid"],
        },
        Seed {
            id: "webhook",
            name: "Generic Webhook",
            description: "Deliver events to any HTTPS endpoint",
            connection_type: ConnectionType::Webhook,
            provider: "custom",
            category: "Integration",
            auth_kind: AuthKind::CustomHeader,
            base_url: "https://example.com/webhook",
            health_endpoint: None,
            steps: &["Enter the endpoint URL and any signing headers"],
            popular: false,
            tags: &["webhook", "events"],
        },
    ];

    seeds.into_iter().map(Seed::into_template).collect()
}
