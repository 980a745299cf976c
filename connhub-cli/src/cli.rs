//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use connhub_core::models::{ConnectionStatus, ConnectionType, HttpMethod};
use uuid::Uuid;

/// `ConnHub` command-line interface for managing integration connections
#[derive(Parser)]
#[command(name = "connhub-cli")]
#[command(author, version, about = "ConnHub command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the persistence service
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token for the persistence service
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List connections
    #[command(about = "List connections with optional filters")]
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Filter by connection type (api, database, webhook, ...)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        connection_type: Option<ConnectionType>,

        /// Filter by status (pending, testing, active, inactive, error)
        #[arg(short, long)]
        status: Option<ConnectionStatus>,

        /// Filter by provider
        #[arg(short, long)]
        provider: Option<String>,

        /// Search name, provider, description and tags
        #[arg(long)]
        search: Option<String>,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (max 100)
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Show one connection
    #[command(about = "Show connection details")]
    Show {
        /// Connection UUID
        id: Uuid,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Add a new connection
    #[command(about = "Add a new connection")]
    Add(AddArgs),

    /// Update an existing connection
    #[command(about = "Update fields of an existing connection")]
    Update(UpdateArgs),

    /// Delete a connection
    #[command(about = "Delete a connection")]
    Delete {
        /// Connection UUID
        id: Uuid,
    },

    /// Enable a connection
    #[command(about = "Mark a connection active")]
    Activate {
        /// Connection UUID
        id: Uuid,
    },

    /// Disable a connection
    #[command(about = "Mark a connection inactive")]
    Deactivate {
        /// Connection UUID
        id: Uuid,
    },

    /// Test connectivity
    #[command(about = "Test one connection, or all with 'all'")]
    Test {
        /// Connection UUID or 'all'
        target: String,

        /// Use the health-check timeout and mode
        #[arg(long)]
        health_check: bool,

        /// Endpoint override: absolute URL or path relative to the base URL
        #[arg(long, conflicts_with = "health_check")]
        endpoint: Option<String>,

        /// HTTP method override
        #[arg(long)]
        method: Option<HttpMethod>,
    },

    /// List connections due for a scheduled health check
    #[command(name = "health-due", about = "List or run due health checks")]
    HealthDue {
        /// Run the due checks instead of listing them
        #[arg(long)]
        run: bool,
    },

    /// Show recent test results
    #[command(about = "Show recent test results for a connection")]
    History {
        /// Connection UUID
        id: Uuid,

        /// Number of results to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show dashboard statistics
    #[command(about = "Show connection statistics")]
    Stats {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// List built-in templates
    #[command(about = "List built-in connection templates")]
    Templates {
        /// Only templates matching this term
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Arguments for `add`
#[derive(Args)]
pub struct AddArgs {
    /// Name for the new connection
    #[arg(short, long)]
    pub name: String,

    /// Template to pre-fill type, provider, URL and health check from
    #[arg(long, value_name = "ID")]
    pub template: Option<String>,

    /// Connection type (required without --template)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub connection_type: Option<ConnectionType>,

    /// Provider key, e.g. stripe (required without --template)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Base URL (required without --template)
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Create the connection inactive
    #[arg(long)]
    pub inactive: bool,

    /// Test the connection details without saving them
    #[arg(long)]
    pub test_only: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Arguments for `update`
#[derive(Args)]
pub struct UpdateArgs {
    /// Connection UUID
    pub id: Uuid,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New provider
    #[arg(short, long)]
    pub provider: Option<String>,

    /// New base URL
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Replace tags (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Health-check endpoint
    #[arg(long)]
    pub health_endpoint: Option<String>,

    /// Minutes between scheduled health checks
    #[arg(long)]
    pub health_interval: Option<u32>,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Timeout and retry flags shared by `add` and `update`
#[derive(Args)]
pub struct TuningArgs {
    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after the first attempt
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    pub retry_delay: Option<u64>,
}

/// Credential flags shared by `add` and `update`
#[derive(Args)]
pub struct AuthArgs {
    /// Authentication kind
    #[arg(long, value_enum)]
    pub auth: Option<AuthArg>,

    /// API key (api-key auth)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Header or query parameter carrying the API key
    #[arg(long, value_name = "NAME")]
    pub api_key_name: Option<String>,

    /// Send the API key as a query parameter instead of a header
    #[arg(long)]
    pub api_key_in_query: bool,

    /// Token (bearer or jwt auth)
    #[arg(long, value_name = "TOKEN")]
    pub auth_token: Option<String>,

    /// Username (basic auth)
    #[arg(long)]
    pub username: Option<String>,

    /// Password (basic auth)
    #[arg(long)]
    pub password: Option<String>,
}

/// Authentication kinds settable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// No authentication
    None,
    /// API key in a header or query parameter
    ApiKey,
    /// Bearer token
    Bearer,
    /// HTTP Basic
    Basic,
    /// JWT sent as a bearer token
    Jwt,
}

/// Output format for listings
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns
    #[default]
    Table,
    /// JSON
    Json,
    /// Comma-separated values
    Csv,
}
