//! `ConnHub` CLI - Command-line interface for the `ConnHub` connection
//! management core
//!
//! Provides commands for listing, adding, updating, activating and testing
//! connections, running due health checks, and browsing history, statistics
//! and built-in templates.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use clap::Parser;
use cli::Cli;
use connhub_core::tracing::{TracingConfig, TracingLevel, init_tracing};

use crate::util::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 && !cli.quiet {
        let config = TracingConfig::new().with_level(TracingLevel::from_verbosity(cli.verbose));
        if let Err(e) = init_tracing(&config) {
            eprintln!("Warning: failed to initialize logging: {e}");
        }
    }

    let options = GlobalOptions {
        config_path: cli.config.as_deref(),
        api_url: cli.api_url.as_deref(),
        token: cli.token.as_deref(),
    };

    let result = commands::dispatch(&options, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
