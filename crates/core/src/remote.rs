//! Remote command execution seam.
//!
//! Backends hand out [`RemoteClient`] handles; introspection and test groups
//! use them to run commands on the instance. The trait is dyn-compatible so
//! one client can be shared as `Arc<dyn RemoteClient>` across the suite.

use crate::error::{ArgusError, RemoteError};
use crate::types::{BoxFuture, CommandOutput, CommandType};

/// A transport able to run commands on one instance.
pub trait RemoteClient: Send + Sync {
    /// Human-readable target (e.g. `admin@10.0.0.5:22`).
    fn target(&self) -> String;

    /// Run `command` and capture its output, whatever its exit code.
    fn run_command<'a>(
        &'a self,
        command: &'a str,
        command_type: CommandType,
    ) -> BoxFuture<'a, Result<CommandOutput, ArgusError>>;

    /// Run `command` and return stdout, failing on a non-zero exit code.
    fn run_command_verbose<'a>(
        &'a self,
        command: &'a str,
        command_type: CommandType,
    ) -> BoxFuture<'a, Result<String, ArgusError>> {
        Box::pin(async move {
            let output = self.run_command(command, command_type).await?;
            tracing::debug!(
                target_host = %self.target(),
                command = command,
                exit_code = output.exit_code,
                "remote command finished"
            );
            if output.success() {
                Ok(output.stdout)
            } else {
                Err(RemoteError::CommandFailed {
                    command: command.to_owned(),
                    exit_code: output.exit_code,
                    stderr: output.stderr.trim().to_owned(),
                }
                .into())
            }
        })
    }
}
