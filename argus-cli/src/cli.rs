//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Argus -- scenario harness for cloud guest boot-configuration testing.
///
/// Use `argus <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "argus", version, about, long_about = None)]
pub struct Cli {
    /// Path to the argus.toml configuration file.
    #[arg(short, long, default_value = "argus.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List composed scenarios and their bound tests.
    List(ListArgs),

    /// Run scenarios against their instances.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- list ----

/// List composed scenarios.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only these scenarios (repeatable; default: all).
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,
}

// ---- run ----

/// Set up, test and tear down scenarios.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only these scenarios (repeatable; default: all).
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Only run tests whose name contains this substring.
    #[arg(short, long, value_name = "SUBSTR")]
    pub filter: Option<String>,

    /// Run scenarios concurrently.
    #[arg(long)]
    pub parallel: bool,
}

// ---- config ----

/// Manage argus configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, credentials, static_backend, recipe,
        /// introspection, scenarios).
        #[arg(long)]
        section: Option<String>,
    },
}
