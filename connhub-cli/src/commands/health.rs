//! Scheduled health-check command.

use chrono::Utc;
use uuid::Uuid;

use super::test::print_report;
use crate::error::CliError;
use crate::util::{GlobalOptions, block_on, create_registry};

/// Lists connections due for a health check, or runs them with `run`
pub fn cmd_health_due(options: &GlobalOptions<'_>, run: bool) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let now = Utc::now();

    let (due, report) = block_on(async {
        let ids = registry.due_health_checks(now).await?;
        let mut due: Vec<(Uuid, String)> = Vec::with_capacity(ids.len());
        for id in ids {
            let connection = registry.get(id).await?;
            due.push((id, connection.name));
        }
        let report = if run && !due.is_empty() {
            Some(registry.run_due_health_checks(now).await?)
        } else {
            None
        };
        Ok::<_, CliError>((due, report))
    })??;

    if due.is_empty() {
        println!("No health checks due.");
        return Ok(());
    }

    let Some(report) = report else {
        println!("{} connection(s) due for a health check:", due.len());
        for (id, name) in &due {
            println!("  {id}  {name}");
        }
        return Ok(());
    };

    print_report(&due, &report);
    if report.all_healthy() {
        Ok(())
    } else {
        Err(CliError::TestFailed(report.summary_line()))
    }
}
