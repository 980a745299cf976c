//! Dashboard statistics command.

use std::fmt::Write as _;

use chrono::Utc;
use connhub_core::DashboardStats;
use connhub_core::models::ConnectionStatus;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{csv_line, format_seconds, to_json};
use crate::util::{GlobalOptions, block_on, create_registry};

/// Statistics command handler
pub fn cmd_stats(options: &GlobalOptions<'_>, format: OutputFormat) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let stats = block_on(registry.stats(Utc::now()))??;

    match format {
        OutputFormat::Table => print!("{}", format_stats(&stats)),
        OutputFormat::Json => println!("{}", to_json(&stats)?),
        OutputFormat::Csv => {
            println!("metric,value");
            println!("{}", csv_line(&["total".to_string(), stats.total.to_string()]));
            for status in ConnectionStatus::ALL {
                println!(
                    "{}",
                    csv_line(&[
                        format!("status.{status}"),
                        stats.by_status.get(status).to_string()
                    ])
                );
            }
            for (connection_type, count) in &stats.by_type {
                println!(
                    "{}",
                    csv_line(&[format!("type.{connection_type}"), count.to_string()])
                );
            }
            println!("{}", csv_line(&["uptime".to_string(), format!("{:.1}", stats.uptime)]));
            println!(
                "{}",
                csv_line(&[
                    "average_response_time".to_string(),
                    stats
                        .average_response_time
                        .map(|t| format!("{t:.3}"))
                        .unwrap_or_default()
                ])
            );
            println!(
                "{}",
                csv_line(&["recently_used".to_string(), stats.recently_used.len().to_string()])
            );
        }
    }
    Ok(())
}

/// Formats statistics for terminal output
#[must_use]
pub fn format_stats(stats: &DashboardStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Connection Statistics");
    let _ = writeln!(output, "=====================");
    let _ = writeln!(output, "Total:            {}", stats.total);
    let _ = writeln!(output, "Uptime:           {:.1}%", stats.uptime);
    let _ = writeln!(
        output,
        "Avg response:     {}",
        stats
            .average_response_time
            .map_or_else(|| "-".to_string(), format_seconds)
    );
    let _ = writeln!(output, "Used in last 24h: {}", stats.recently_used.len());

    let _ = writeln!(output, "\nBy status:");
    for status in ConnectionStatus::ALL {
        let _ = writeln!(output, "  {:<10} {}", status.label(), stats.by_status.get(status));
    }

    let used: Vec<_> = stats.by_type.iter().filter(|(_, n)| **n > 0).collect();
    if !used.is_empty() {
        let _ = writeln!(output, "\nBy type:");
        for (connection_type, count) in used {
            let _ = writeln!(output, "  {:<14} {count}", connection_type.to_string());
        }
    }
    output
}
