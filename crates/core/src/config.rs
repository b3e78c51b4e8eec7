//! Configuration: `argus.toml` parsing and runtime settings.
//!
//! [`ArgusConfig`] is loaded once, before any scenario is composed, and then
//! passed by reference (`Arc<ArgusConfig>`) into the lifecycle orchestrator
//! and from there into every collaborator constructor.
//!
//! # Loading precedence
//! 1. CLI arguments (highest)
//! 2. Environment variables (`ARGUS_STATIC_BACKEND_HOST=10.0.0.5`)
//! 3. Config file (`argus.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), argus_core::error::ArgusError> {
//! use argus_core::config::ArgusConfig;
//!
//! let config = ArgusConfig::load("argus.toml").await?;
//! let config = ArgusConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ArgusError, ConfigError};
use crate::types::{CommandType, Credentials};

/// Root of `argus.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgusConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Per-platform credentials (`[credentials.windows]`, `[credentials.linux]`)
    #[serde(default)]
    pub credentials: BTreeMap<String, Credentials>,
    /// Settings for the `static` backend
    #[serde(default)]
    pub static_backend: StaticBackendConfig,
    /// Settings for the `commands` recipe
    #[serde(default)]
    pub recipe: RecipeConfig,
    /// Settings for the introspection variants
    #[serde(default)]
    pub introspection: IntrospectionConfig,
    /// Per-scenario overrides, keyed by scenario name
    #[serde(default)]
    pub scenarios: BTreeMap<String, ScenarioOverride>,
}

impl ArgusConfig {
    /// Load from a TOML file, apply environment overrides and validate.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ArgusError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ArgusError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArgusError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ArgusError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ArgusError> {
        toml::from_str(toml_str).map_err(|e| {
            ArgusError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override values from the environment.
    ///
    /// Naming: `ARGUS_{SECTION}_{FIELD}`, e.g. `ARGUS_GENERAL_OUTPUT_DIRECTORY`.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ARGUS_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ARGUS_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.output_directory,
            "ARGUS_GENERAL_OUTPUT_DIRECTORY",
        );

        // Static backend
        override_string(&mut self.static_backend.host, "ARGUS_STATIC_BACKEND_HOST");
        override_u16(&mut self.static_backend.port, "ARGUS_STATIC_BACKEND_PORT");
        override_string(
            &mut self.static_backend.platform,
            "ARGUS_STATIC_BACKEND_PLATFORM",
        );
        override_string(
            &mut self.static_backend.ssh_binary,
            "ARGUS_STATIC_BACKEND_SSH_BINARY",
        );
        override_u64(
            &mut self.static_backend.connect_timeout_secs,
            "ARGUS_STATIC_BACKEND_CONNECT_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.static_backend.command_timeout_secs,
            "ARGUS_STATIC_BACKEND_COMMAND_TIMEOUT_SECS",
        );
        override_string(
            &mut self.static_backend.console_log_path,
            "ARGUS_STATIC_BACKEND_CONSOLE_LOG_PATH",
        );

        // Recipe
        override_csv(&mut self.recipe.commands, "ARGUS_RECIPE_COMMANDS");
        override_string(&mut self.recipe.command_type, "ARGUS_RECIPE_COMMAND_TYPE");
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ArgusError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        for (platform, creds) in &self.credentials {
            if creds.username.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("credentials.{platform}.username"),
                    reason: "username must not be empty".to_owned(),
                }
                .into());
            }
        }

        if self.static_backend.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "static_backend.port".to_owned(),
                reason: "port must be non-zero".to_owned(),
            }
            .into());
        }

        if self.static_backend.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "static_backend.command_timeout_secs".to_owned(),
                reason: "timeout must be non-zero".to_owned(),
            }
            .into());
        }

        if let Err(reason) = self.recipe.command_type.parse::<CommandType>() {
            return Err(ConfigError::InvalidValue {
                field: "recipe.command_type".to_owned(),
                reason,
            }
            .into());
        }

        for (name, scenario) in &self.scenarios {
            let blank_tag = scenario
                .service_tag
                .as_deref()
                .is_some_and(|tag| tag.trim().is_empty());
            if blank_tag {
                return Err(ConfigError::InvalidValue {
                    field: format!("scenarios.{name}.service_tag"),
                    reason: "service tag must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Credentials for a platform (`"windows"`, `"linux"`, ...).
    pub fn credentials_for(&self, platform: &str) -> Option<&Credentials> {
        self.credentials.get(platform)
    }

    /// Override block for a scenario, if any.
    pub fn scenario_override(&self, scenario: &str) -> Option<&ScenarioOverride> {
        self.scenarios.get(scenario)
    }

    /// Output directory for diagnostic artifacts, `None` when unset.
    pub fn output_directory(&self) -> Option<&Path> {
        if self.general.output_directory.is_empty() {
            None
        } else {
            Some(Path::new(&self.general.output_directory))
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log format (json, pretty)
    pub log_format: String,
    /// Where console logs and other artifacts are saved; empty disables saving
    pub output_directory: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            output_directory: String::new(),
        }
    }
}

/// Settings for the `static` backend, which targets an already running host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticBackendConfig {
    /// Host name or address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Credentials key under `[credentials]`
    pub platform: String,
    /// `ssh` executable
    pub ssh_binary: String,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Per-command timeout (seconds)
    pub command_timeout_secs: u64,
    /// Remote file holding the instance console log; empty when unavailable
    pub console_log_path: String,
}

impl Default for StaticBackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 22,
            platform: "windows".to_owned(),
            ssh_binary: "ssh".to_owned(),
            connect_timeout_secs: 10,
            command_timeout_secs: 120,
            console_log_path: String::new(),
        }
    }
}

/// Settings for the `commands` recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    /// Commands run in order during preparation
    pub commands: Vec<String>,
    /// Interpreter for the commands (shell, cmd, powershell)
    pub command_type: String,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            command_type: "powershell".to_owned(),
        }
    }
}

/// Settings for the introspection variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectionConfig {
    /// Init service log on Windows instances
    pub windows_init_log: String,
    /// Init service log on Linux instances
    pub linux_init_log: String,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            windows_init_log:
                r"C:\Program Files\Cloudbase Solutions\Cloudbase-Init\log\cloudbase-init.log"
                    .to_owned(),
            linux_init_log: "/var/log/cloud-init.log".to_owned(),
        }
    }
}

/// Per-scenario overrides (`[scenarios.WindowsSmokeHttp]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverride {
    /// Replaces the descriptor's service tag
    pub service_tag: Option<String>,
    /// Replaces the descriptor's availability zone
    pub availability_zone: Option<String>,
    /// Merged over the descriptor's metadata
    pub metadata: BTreeMap<String, String>,
    /// Replaces the descriptor's user data
    pub userdata: Option<String>,
    /// Leave this scenario out of runs
    pub skip: bool,
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(v) => *target = v,
            Err(_) => warn!(key = env_key, value = %val, "invalid u16 env override, ignored"),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(v) => *target = v,
            Err(_) => warn!(key = env_key, value = %val, "invalid u64 env override, ignored"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
