//! Activate and deactivate commands.

use uuid::Uuid;

use crate::error::CliError;
use crate::util::{GlobalOptions, block_on, create_registry};

/// Sets the administrative on/off switch of a connection
pub fn cmd_set_active(options: &GlobalOptions<'_>, id: Uuid, active: bool) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    let connection = block_on(registry.set_active(id, active))??;

    println!(
        "Connection '{}' is now {} (status: {})",
        connection.name,
        if connection.is_active { "enabled" } else { "disabled" },
        connection.status
    );
    Ok(())
}
