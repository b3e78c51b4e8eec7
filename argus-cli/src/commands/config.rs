//! `argus config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use argus_core::config::ArgusConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 6] = [
    "general",
    "credentials",
    "static_backend",
    "recipe",
    "introspection",
    "scenarios",
];

const REDACTED: &str = "***REDACTED***";

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the file, reporting every error.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing or invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match ArgusConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Show the effective configuration with passwords redacted.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let mut config = ArgusConfig::load(config_path).await?;
    redact_credentials(&mut config);

    let config_toml = match section.as_deref() {
        None => to_toml(&config),
        Some("general") => to_toml(&config.general),
        Some("credentials") => to_toml(&config.credentials),
        Some("static_backend") => to_toml(&config.static_backend),
        Some("recipe") => to_toml(&config.recipe),
        Some("introspection") => to_toml(&config.introspection),
        Some("scenarios") => to_toml(&config.scenarios),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: {})",
                SECTIONS.join(", ")
            )));
        }
    };

    let report = ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    };
    writer.render(&report)?;
    Ok(())
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {e})"))
}

/// Replace every configured password with a placeholder.
fn redact_credentials(config: &mut ArgusConfig) {
    for credentials in config.credentials.values_mut() {
        if credentials.password.is_some() {
            credentials.password = Some(REDACTED.to_owned());
        }
    }
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(section) = &self.section {
            let label = format!("[{section}]");
            writeln!(
                w,
                "Configuration {} (source: {})",
                label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
