//! Instance preparation recipes.

use argus_core::error::{ArgusError, ConfigError, RecipeError};
use argus_core::recipe::{Recipe, RecipeParams};
use argus_core::types::CommandType;
use tracing::info;

/// Variant name of [`NoopRecipe`].
pub const NOOP_RECIPE: &str = "noop";

/// Variant name of [`CommandRecipe`].
pub const COMMAND_RECIPE: &str = "commands";

/// Environment variable carrying the scenario's service tag.
pub const SERVICE_TAG_ENV: &str = "ARGUS_SERVICE_TAG";

/// Recipe that leaves the instance as booted.
pub struct NoopRecipe {
    params: RecipeParams,
}

impl NoopRecipe {
    pub fn new(params: RecipeParams) -> Self {
        Self { params }
    }
}

impl Recipe for NoopRecipe {
    fn name(&self) -> &str {
        NOOP_RECIPE
    }

    async fn prepare(&self) -> Result<(), ArgusError> {
        info!(
            instance = self.params.backend.name(),
            service_tag = %self.params.service_tag,
            "nothing to prepare"
        );
        Ok(())
    }
}

/// Recipe running the configured `[recipe].commands` in order.
pub struct CommandRecipe {
    params: RecipeParams,
    command_type: CommandType,
}

impl CommandRecipe {
    /// Fails when `[recipe].command_type` is not a known interpreter.
    pub fn new(params: RecipeParams) -> Result<Self, ArgusError> {
        let command_type = params
            .config
            .recipe
            .command_type
            .parse::<CommandType>()
            .map_err(|reason| ConfigError::InvalidValue {
                field: "recipe.command_type".to_owned(),
                reason,
            })?;
        Ok(Self {
            params,
            command_type,
        })
    }
}

/// Prefix `command` so it sees the service tag in its environment.
pub fn with_service_tag(command: &str, command_type: CommandType, service_tag: &str) -> String {
    match command_type {
        CommandType::Shell => format!(
            "{SERVICE_TAG_ENV}='{}' {command}",
            service_tag.replace('\'', r"'\''")
        ),
        CommandType::Cmd => format!("set {SERVICE_TAG_ENV}={service_tag}&& {command}"),
        CommandType::Powershell => format!(
            "$env:{SERVICE_TAG_ENV}='{}'; {command}",
            service_tag.replace('\'', "''")
        ),
    }
}

impl Recipe for CommandRecipe {
    fn name(&self) -> &str {
        COMMAND_RECIPE
    }

    async fn prepare(&self) -> Result<(), ArgusError> {
        let commands = &self.params.config.recipe.commands;
        if commands.is_empty() {
            info!(instance = self.params.backend.name(), "no recipe commands configured");
            return Ok(());
        }

        let client = self.params.backend.remote_client()?;
        for (step, command) in commands.iter().enumerate() {
            info!(
                instance = self.params.backend.name(),
                step = step + 1,
                total = commands.len(),
                command = %command,
                "running recipe step"
            );
            let line = with_service_tag(command, self.command_type, &self.params.service_tag);
            let output = client.run_command(&line, self.command_type).await?;
            if !output.success() {
                return Err(RecipeError::StepFailed {
                    step: command.clone(),
                    reason: format!(
                        "exit code {}: {}",
                        output.exit_code,
                        output.stderr.trim()
                    ),
                }
                .into());
            }
        }
        Ok(())
    }
}
