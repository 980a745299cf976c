//! List connections command.

use connhub_core::models::{Connection, ConnectionStatus, ConnectionType};
use connhub_core::store::{ConnectionPage, ConnectionQuery};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{csv_line, format_columns, redacted, to_json};
use crate::util::{GlobalOptions, block_on, create_registry, truncate};

/// Filters accepted by `list`
pub struct ListFilter {
    pub connection_type: Option<ConnectionType>,
    pub status: Option<ConnectionStatus>,
    pub provider: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListFilter {
    fn into_query(self) -> ConnectionQuery {
        let mut query = ConnectionQuery::page(self.page, self.limit);
        if let Some(connection_type) = self.connection_type {
            query = query.with_type(connection_type);
        }
        if let Some(status) = self.status {
            query = query.with_status(status);
        }
        if let Some(provider) = self.provider {
            query = query.with_provider(provider);
        }
        if let Some(search) = self.search {
            query = query.with_search(search);
        }
        query
    }
}

/// List connections command handler
pub fn cmd_list(
    options: &GlobalOptions<'_>,
    format: OutputFormat,
    filter: ListFilter,
) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let query = filter.into_query();
    let page = block_on(registry.list(&query))??;

    match format {
        OutputFormat::Table => println!("{}", format_table(&page)),
        OutputFormat::Json => {
            let connections = page
                .connections
                .iter()
                .map(redacted)
                .collect::<Result<Vec<_>, _>>()?;
            println!(
                "{}",
                to_json(&serde_json::json!({
                    "connections": connections,
                    "total": page.total,
                    "page": page.page,
                    "limit": page.limit,
                }))?
            );
        }
        OutputFormat::Csv => print!("{}", format_csv(&page.connections)),
    }

    Ok(())
}

/// Formats a page of connections as a table
#[must_use]
pub fn format_table(page: &ConnectionPage) -> String {
    if page.connections.is_empty() {
        return "No connections found.".to_string();
    }

    let rows: Vec<Vec<String>> = page
        .connections
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                truncate(&c.name, 32),
                c.connection_type.to_string(),
                c.provider.clone(),
                c.status.to_string(),
                c.last_tested
                    .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
            ]
        })
        .collect();

    let table = format_columns(
        &["ID", "NAME", "TYPE", "PROVIDER", "STATUS", "LAST TESTED"],
        &rows,
    );
    format!(
        "{table}\n\nPage {} ({} of {} connections)",
        page.page,
        page.connections.len(),
        page.total
    )
}

/// Formats connections as CSV with a header row
#[must_use]
pub fn format_csv(connections: &[Connection]) -> String {
    let mut output = csv_line(&["id", "name", "type", "provider", "status", "active", "base_url"]);
    output.push('\n');
    for c in connections {
        output.push_str(&csv_line(&[
            c.id.to_string(),
            c.name.clone(),
            c.connection_type.to_string(),
            c.provider.clone(),
            c.status.to_string(),
            c.is_active.to_string(),
            c.config.base_url.clone(),
        ]));
        output.push('\n');
    }
    output
}
