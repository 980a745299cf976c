//! Output helpers shared by the listing commands.

use std::fmt::Write as _;

use connhub_core::models::Connection;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::CliError;

/// Escapes a CSV field, quoting it when it contains a separator, quote or
/// line break
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Joins escaped fields into one CSV line
pub fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders rows as left-aligned columns under a dashed header
///
/// Every row must have as many cells as `headers`.
pub fn format_columns(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r.get(i).map_or(0, |c| c.chars().count()))
                .max()
                .unwrap_or(0)
                .max(h.len())
        })
        .collect();

    let mut output = String::new();
    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(output, "{}", line(headers.iter().map(|h| (*h).to_string()).collect()));
    let _ = writeln!(output, "{}", line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        let _ = writeln!(output, "{}", line(row.clone()));
    }

    output.trim_end().to_string()
}

/// Pretty-printed JSON
///
/// # Errors
///
/// Returns `CliError::Output` if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// JSON view of a connection with the credential payload reduced to its
/// kind
///
/// # Errors
///
/// Returns `CliError::Output` if serialization fails.
pub fn redacted(connection: &Connection) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(connection)?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "credentials".to_string(),
            json!({ "type": connection.credentials.kind().as_str() }),
        );
    }
    Ok(value)
}

/// Seconds as a short human duration, e.g. `1.25s` or `340ms`
pub fn format_seconds(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else {
        format!("{seconds:.2}s")
    }
}
