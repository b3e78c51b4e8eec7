//! `argus` -- compose and run cloud guest boot-configuration scenarios.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use argus_core::config::{ArgusConfig, GeneralConfig};

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging settings come from the file when it parses; commands load
    // and validate it again on their own terms.
    let mut general = ArgusConfig::from_file(&cli.config)
        .await
        .map(|c| c.general)
        .unwrap_or_else(|_| GeneralConfig {
            log_level: "warn".to_owned(),
            ..GeneralConfig::default()
        });
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("argus: {e}");
        return ExitCode::from(2);
    }
    argus_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "argus starting");

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::List(args) => commands::list::execute(args, &cli.config, &writer).await,
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, exit_code = e.exit_code(), "command failed");
            eprintln!("argus: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
