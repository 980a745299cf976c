//! Add connection command.

use connhub_core::TestOverrides;
use connhub_core::models::{ConnectionConfig, ConnectionFormData};
use connhub_core::template::find_template;

use super::test::{check_result, print_test_result};
use crate::cli::{AddArgs, TuningArgs};
use crate::error::CliError;
use crate::util::{GlobalOptions, block_on, create_registry, credentials_from_args};

/// Add connection command handler
pub fn cmd_add(options: &GlobalOptions<'_>, args: &AddArgs) -> Result<(), CliError> {
    let form = build_form(args)?;
    let registry = create_registry(options)?;

    if args.test_only {
        println!("Testing connection '{}'...\n", form.name);
        let result = block_on(registry.test_form(&form, &TestOverrides::default()))??;
        print_test_result(&form.name, &result);
        return check_result(result);
    }

    let connection = block_on(registry.create(form))??;

    println!(
        "Created connection '{}' ({}) with ID {}",
        connection.name, connection.connection_type, connection.id
    );
    Ok(())
}

/// Builds form data from a template or from explicit flags
pub fn build_form(args: &AddArgs) -> Result<ConnectionFormData, CliError> {
    let mut form = match args.template.as_deref() {
        Some(template_id) => {
            let template = find_template(template_id)
                .ok_or_else(|| CliError::Template(template_id.to_string()))?;
            let mut form = ConnectionFormData::from_template(&template, &args.name);
            if let Some(connection_type) = args.connection_type {
                form.connection_type = connection_type;
            }
            if let Some(ref provider) = args.provider {
                form.provider.clone_from(provider);
            }
            if let Some(ref base_url) = args.base_url {
                form.config.base_url.clone_from(base_url);
            }
            form
        }
        None => {
            let missing = |flag: &str| {
                CliError::Validation(format!("--{flag} is required without --template"))
            };
            ConnectionFormData::new(
                &args.name,
                args.connection_type.ok_or_else(|| missing("type"))?,
                args.provider.as_deref().ok_or_else(|| missing("provider"))?,
                args.base_url.as_deref().ok_or_else(|| missing("base-url"))?,
            )
        }
    };

    if args.description.is_some() {
        form.description.clone_from(&args.description);
    }
    form.tags.extend(args.tags.iter().cloned());
    form.config = apply_tuning(form.config, &args.tuning);
    if let Some(credentials) = credentials_from_args(&args.auth)? {
        form = form.with_credentials(credentials);
    }
    Ok(form.with_active(!args.inactive))
}

/// Applies `--timeout`, `--retry-attempts` and `--retry-delay`
pub fn apply_tuning(mut config: ConnectionConfig, tuning: &TuningArgs) -> ConnectionConfig {
    if let Some(timeout) = tuning.timeout {
        config.timeout = timeout;
    }
    if let Some(retry_attempts) = tuning.retry_attempts {
        config.retry_attempts = retry_attempts;
    }
    if let Some(retry_delay) = tuning.retry_delay {
        config.retry_delay = retry_delay;
    }
    config
}
