//! Test history command.

use uuid::Uuid;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{csv_line, format_columns, format_seconds, to_json};
use crate::util::{GlobalOptions, block_on, create_registry};

/// Shows recent test results for a connection
///
/// Results are kept by the registry that produced them, so a fresh CLI
/// process falls back to the counters stored on the connection.
pub fn cmd_history(
    options: &GlobalOptions<'_>,
    id: Uuid,
    limit: usize,
    format: OutputFormat,
) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let (connection, results) = block_on(async {
        let connection = registry.get(id).await?;
        let results = registry.history(id, limit).await?;
        Ok::<_, CliError>((connection, results))
    })??;

    match format {
        OutputFormat::Json => println!("{}", to_json(&results)?),
        OutputFormat::Csv => {
            println!("{}", csv_line(&["timestamp", "success", "status_code", "response_time", "error"]));
            for r in &results {
                println!(
                    "{}",
                    csv_line(&[
                        r.timestamp.to_rfc3339(),
                        r.success.to_string(),
                        r.status_code.map(|s| s.to_string()).unwrap_or_default(),
                        r.response_time.map(|t| format!("{t:.3}")).unwrap_or_default(),
                        r.error.clone().unwrap_or_default(),
                    ])
                );
            }
        }
        OutputFormat::Table => {
            if results.is_empty() {
                println!(
                    "No recorded results for '{}'. Totals: {} passed, {} failed, last tested {}.",
                    connection.name,
                    connection.success_count,
                    connection.error_count,
                    connection
                        .last_tested
                        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
                );
                return Ok(());
            }
            let rows: Vec<Vec<String>> = results
                .iter()
                .map(|r| {
                    vec![
                        r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        if r.success { "ok" } else { "failed" }.to_string(),
                        r.response_time.map(format_seconds).unwrap_or_default(),
                        r.attempts.to_string(),
                        r.error.clone().unwrap_or_else(|| r.message.clone()),
                    ]
                })
                .collect();
            println!(
                "{}",
                format_columns(&["TIME", "RESULT", "LATENCY", "ATTEMPTS", "DETAIL"], &rows)
            );
        }
    }
    Ok(())
}
