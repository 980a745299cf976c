//! Update connection command.

use connhub_core::models::{Connection, ConnectionUpdate};

use super::add::apply_tuning;
use crate::cli::UpdateArgs;
use crate::error::CliError;
use crate::util::{GlobalOptions, block_on, create_registry, credentials_from_args};

/// Update connection command handler
pub fn cmd_update(options: &GlobalOptions<'_>, args: &UpdateArgs) -> Result<(), CliError> {
    let registry = create_registry(options)?;

    let updated = block_on(async {
        let current = registry.get(args.id).await?;
        let update = build_update(&current, args)?;
        registry.update(args.id, update).await.map_err(CliError::from)
    })??;

    println!("Updated connection '{}' (ID: {})", updated.name, updated.id);
    Ok(())
}

/// Builds a partial update from the flags that were given
///
/// Transport and health-check flags are merged into the stored settings.
pub fn build_update(current: &Connection, args: &UpdateArgs) -> Result<ConnectionUpdate, CliError> {
    let mut update = ConnectionUpdate {
        name: args.name.clone(),
        description: args.description.clone(),
        provider: args.provider.clone(),
        credentials: credentials_from_args(&args.auth)?,
        ..ConnectionUpdate::default()
    };
    if !args.tags.is_empty() {
        update.tags = Some(args.tags.clone());
    }

    let tuning = &args.tuning;
    if args.base_url.is_some()
        || tuning.timeout.is_some()
        || tuning.retry_attempts.is_some()
        || tuning.retry_delay.is_some()
    {
        let mut config = apply_tuning(current.config.clone(), tuning);
        if let Some(ref base_url) = args.base_url {
            config.base_url.clone_from(base_url);
        }
        update.config = Some(config);
    }

    if args.health_endpoint.is_some() || args.health_interval.is_some() {
        let mut health_check = current.health_check.clone();
        if args.health_endpoint.is_some() {
            health_check.endpoint.clone_from(&args.health_endpoint);
        }
        if let Some(interval) = args.health_interval {
            health_check.interval = interval;
        }
        update.health_check = Some(health_check);
    }

    if update.is_empty() {
        return Err(CliError::Validation(
            "No changes specified. Use --help to see available options.".to_string(),
        ));
    }
    Ok(update)
}
