//! Command handlers -- one module per subcommand

pub mod config;
pub mod list;
pub mod run;

use std::path::Path;

use tracing::warn;

use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, ConfigError};
use argus_scenario::ScenarioDescriptor;

use crate::error::CliError;

/// Load the configuration, falling back to defaults when the file is absent.
pub(crate) async fn load_config(path: &Path) -> Result<ArgusConfig, CliError> {
    match ArgusConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ArgusError::Config(ConfigError::FileNotFound { .. })) => {
            warn!(path = %path.display(), "configuration file not found, using defaults");
            let mut config = ArgusConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}

/// Configured scenarios, narrowed to `names` when any are given.
///
/// Unknown names are an error; the result keeps catalog order.
pub(crate) fn select_scenarios(
    config: &ArgusConfig,
    names: &[String],
) -> Result<Vec<ScenarioDescriptor>, CliError> {
    let available = argus_checks::configured_scenarios(config);
    if let Some(unknown) = names
        .iter()
        .find(|name| !available.iter().any(|d| &d.name == *name))
    {
        let known: Vec<&str> = available.iter().map(|d| d.name.as_str()).collect();
        return Err(CliError::Command(format!(
            "unknown or skipped scenario '{unknown}' (available: {})",
            known.join(", ")
        )));
    }
    Ok(available
        .into_iter()
        .filter(|d| names.is_empty() || names.contains(&d.name))
        .collect())
}
