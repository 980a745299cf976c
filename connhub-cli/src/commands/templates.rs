//! Built-in template listing command.

use connhub_core::models::ConnectionTemplate;
use connhub_core::template::{list_templates, search_templates};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{csv_line, format_columns, to_json};

/// Lists built-in templates; never contacts the persistence service
pub fn cmd_templates(search: Option<&str>, format: OutputFormat) -> Result<(), CliError> {
    let templates = search.map_or_else(list_templates, search_templates);

    match format {
        OutputFormat::Table => println!("{}", format_table(&templates)),
        OutputFormat::Json => println!("{}", to_json(&templates)?),
        OutputFormat::Csv => {
            println!("{}", csv_line(&["id", "name", "type", "provider", "auth", "base_url"]));
            for t in &templates {
                println!(
                    "{}",
                    csv_line(&[
                        t.id.clone(),
                        t.name.clone(),
                        t.connection_type.to_string(),
                        t.provider.clone(),
                        t.auth_kind.to_string(),
                        t.default_config.base_url.clone(),
                    ])
                );
            }
        }
    }
    Ok(())
}

fn format_table(templates: &[ConnectionTemplate]) -> String {
    if templates.is_empty() {
        return "No templates found.".to_string();
    }
    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                format!("{}{}", t.name, if t.is_popular { " *" } else { "" }),
                t.connection_type.to_string(),
                t.auth_kind.to_string(),
                t.category.clone(),
            ]
        })
        .collect();
    format_columns(&["ID", "NAME", "TYPE", "AUTH", "CATEGORY"], &rows)
}
