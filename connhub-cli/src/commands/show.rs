//! Show connection details command.

use std::fmt::Write as _;

use connhub_core::models::{ApiKeyLocation, Connection, Credentials};
use uuid::Uuid;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{csv_line, redacted, to_json};
use crate::util::{GlobalOptions, block_on, create_registry};

/// Show connection command handler
pub fn cmd_show(options: &GlobalOptions<'_>, id: Uuid, format: OutputFormat) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let connection = block_on(registry.get(id))??;

    match format {
        OutputFormat::Table => print!("{}", format_details(&connection)),
        OutputFormat::Json => println!("{}", to_json(&redacted(&connection)?)?),
        OutputFormat::Csv => {
            println!("field,value");
            for (field, value) in summary_fields(&connection) {
                println!("{}", csv_line(&[field.to_string(), value]));
            }
        }
    }
    Ok(())
}

fn summary_fields(connection: &Connection) -> Vec<(&'static str, String)> {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    vec![
        ("id", connection.id.to_string()),
        ("name", connection.name.clone()),
        ("type", connection.connection_type.to_string()),
        ("provider", connection.provider.clone()),
        ("status", connection.status.to_string()),
        ("active", connection.is_active.to_string()),
        ("base_url", connection.config.base_url.clone()),
        ("auth", connection.credentials.kind().to_string()),
        ("successes", connection.success_count.to_string()),
        ("errors", connection.error_count.to_string()),
        (
            "last_tested",
            optional(connection.last_tested.map(|t| t.to_rfc3339())),
        ),
        (
            "last_connected",
            optional(connection.last_connected.map(|t| t.to_rfc3339())),
        ),
    ]
}

/// Formats a connection as labelled lines
#[must_use]
pub fn format_details(connection: &Connection) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Connection: {}", connection.name);
    let _ = writeln!(output, "  ID:          {}", connection.id);
    let _ = writeln!(output, "  Type:        {}", connection.connection_type);
    let _ = writeln!(output, "  Provider:    {}", connection.provider);
    let _ = writeln!(
        output,
        "  Status:      {}{}",
        connection.status,
        if connection.is_active { "" } else { " (disabled)" }
    );
    if let Some(ref description) = connection.description {
        let _ = writeln!(output, "  Description: {description}");
    }
    if !connection.tags.is_empty() {
        let tags: Vec<&str> = connection.tags.iter().map(String::as_str).collect();
        let _ = writeln!(output, "  Tags:        {}", tags.join(", "));
    }

    let config = &connection.config;
    let _ = writeln!(output, "\nTransport:");
    let _ = writeln!(output, "  Base URL:    {}", config.base_url);
    let _ = writeln!(output, "  Timeout:     {}s", config.timeout);
    let _ = writeln!(
        output,
        "  Retries:     {} (every {}s)",
        config.retry_attempts, config.retry_delay
    );
    let _ = writeln!(output, "  Auth:        {}", describe_credentials(&connection.credentials));

    let health = &connection.health_check;
    let _ = writeln!(output, "\nHealth check:");
    if health.enabled {
        let _ = writeln!(
            output,
            "  Every {} min, {} {} (timeout {}s)",
            health.interval,
            health.method,
            health.endpoint.as_deref().unwrap_or(&config.base_url),
            health.timeout
        );
        if let Some(expected) = health.expected_status {
            let _ = writeln!(output, "  Expects:     {expected}");
        }
    } else {
        let _ = writeln!(output, "  Disabled");
    }

    let _ = writeln!(output, "\nActivity:");
    let _ = writeln!(
        output,
        "  Tests:       {} passed, {} failed",
        connection.success_count, connection.error_count
    );
    let never = || "never".to_string();
    let _ = writeln!(
        output,
        "  Last tested: {}",
        connection.last_tested.map_or_else(never, |t| t.to_rfc3339())
    );
    let _ = writeln!(
        output,
        "  Last OK:     {}",
        connection.last_connected.map_or_else(never, |t| t.to_rfc3339())
    );
    output
}

/// Describes credentials without revealing secrets
fn describe_credentials(credentials: &Credentials) -> String {
    match credentials {
        Credentials::ApiKey { name, location, .. } => {
            let place = match location {
                ApiKeyLocation::Header => "header",
                ApiKeyLocation::Query => "query",
            };
            format!("api key ({name} in {place})")
        }
        Credentials::BasicAuth { username, .. } => format!("basic ({username})"),
        Credentials::CustomHeader { headers } => {
            let names: Vec<&str> = headers.keys().map(String::as_str).collect();
            format!("custom headers ({})", names.join(", "))
        }
        other => other.kind().to_string(),
    }
}
