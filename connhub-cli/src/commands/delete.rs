//! Delete connection command.

use uuid::Uuid;

use crate::error::CliError;
use crate::util::{GlobalOptions, block_on, create_registry};

/// Delete connection command handler
pub fn cmd_delete(options: &GlobalOptions<'_>, id: Uuid) -> Result<(), CliError> {
    let registry = create_registry(options)?;
    block_on(registry.delete(id))??;

    println!("Deleted connection {id}");
    Ok(())
}
