//! Command handler modules for the CLI.

mod activate;
mod add;
mod delete;
mod health;
mod history;
mod list;
mod show;
mod stats;
mod templates;
mod update;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::GlobalOptions;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(options: &GlobalOptions<'_>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List {
            format,
            connection_type,
            status,
            provider,
            search,
            page,
            limit,
        } => list::cmd_list(
            options,
            format,
            list::ListFilter {
                connection_type,
                status,
                provider,
                search,
                page,
                limit,
            },
        ),
        Commands::Show { id, format } => show::cmd_show(options, id, format),
        Commands::Add(args) => add::cmd_add(options, &args),
        Commands::Update(args) => update::cmd_update(options, &args),
        Commands::Delete { id } => delete::cmd_delete(options, id),
        Commands::Activate { id } => activate::cmd_set_active(options, id, true),
        Commands::Deactivate { id } => activate::cmd_set_active(options, id, false),
        Commands::Test {
            target,
            health_check,
            endpoint,
            method,
        } => test::cmd_test(
            options,
            &target,
            health_check,
            connhub_core::TestOverrides { endpoint, method },
        ),
        Commands::HealthDue { run } => health::cmd_health_due(options, run),
        Commands::History { id, limit, format } => history::cmd_history(options, id, limit, format),
        Commands::Stats { format } => stats::cmd_stats(options, format),
        Commands::Templates { search, format } => {
            templates::cmd_templates(search.as_deref(), format)
        }
    }
}
