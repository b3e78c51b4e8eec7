//! Remote commands over the system OpenSSH client.
//!
//! Every command spawns `ssh` in batch mode through `tokio::process` and is
//! bounded by the configured command timeout. The child is killed when the
//! timeout drops its future.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use argus_core::config::StaticBackendConfig;
use argus_core::error::{ArgusError, RemoteError};
use argus_core::remote::RemoteClient;
use argus_core::types::{BoxFuture, CommandOutput, CommandType, Credentials};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::process::Command;
use tracing::{debug, warn};

/// OpenSSH-backed [`RemoteClient`].
#[derive(Debug, Clone)]
pub struct SshRemoteClient {
    ssh_binary: String,
    host: String,
    port: u16,
    username: String,
    private_key_path: Option<PathBuf>,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshRemoteClient {
    /// Client for the host described by `config`, logging in with `credentials`.
    pub fn new(config: &StaticBackendConfig, credentials: &Credentials) -> Self {
        if credentials.password.is_some() && credentials.private_key_path.is_none() {
            warn!(
                host = %config.host,
                username = %credentials.username,
                "batch ssh cannot use passwords; relying on the ssh agent or default keys"
            );
        }
        Self {
            ssh_binary: config.ssh_binary.clone(),
            host: config.host.clone(),
            port: config.port,
            username: credentials.username.clone(),
            private_key_path: credentials.private_key_path.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            command_timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Full `ssh` argument list for one command.
    pub fn build_args(&self, command: &str, command_type: CommandType) -> Vec<String> {
        let mut args = vec![
            "-o".to_owned(),
            "BatchMode=yes".to_owned(),
            "-o".to_owned(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs()),
            "-p".to_owned(),
            self.port.to_string(),
        ];
        if let Some(key) = &self.private_key_path {
            args.push("-i".to_owned());
            args.push(key.display().to_string());
        }
        args.push(format!("{}@{}", self.username, self.host));
        args.push(wrap_command(command, command_type));
        args
    }
}

/// Wrap `command` for the interpreter named by `command_type`.
///
/// PowerShell scripts travel as `-EncodedCommand` (base64 of UTF-16LE), so
/// the remote login shell, whether cmd or POSIX, never sees `$` or quotes.
pub fn wrap_command(command: &str, command_type: CommandType) -> String {
    match command_type {
        CommandType::Shell => command.to_owned(),
        CommandType::Cmd => format!("cmd /c {command}"),
        CommandType::Powershell => format!(
            "powershell -NoProfile -NonInteractive -EncodedCommand {}",
            encode_powershell(command)
        ),
    }
}

/// Base64 of the UTF-16LE script, as `powershell -EncodedCommand` expects.
pub fn encode_powershell(command: &str) -> String {
    let utf16: Vec<u8> = command.encode_utf16().flat_map(u16::to_le_bytes).collect();
    STANDARD.encode(utf16)
}

impl RemoteClient for SshRemoteClient {
    fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }

    fn run_command<'a>(
        &'a self,
        command: &'a str,
        command_type: CommandType,
    ) -> BoxFuture<'a, Result<CommandOutput, ArgusError>> {
        Box::pin(async move {
            let args = self.build_args(command, command_type);
            debug!(target_host = %self.target(), command, %command_type, "running remote command");

            let child = Command::new(&self.ssh_binary)
                .args(&args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(self.command_timeout, child)
                .await
                .map_err(|_| RemoteError::Timeout {
                    command: command.to_owned(),
                    secs: self.command_timeout.as_secs(),
                })?
                .map_err(|e| RemoteError::Spawn(format!("{}: {}", self.ssh_binary, e)))?;

            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(-1),
            })
        })
    }
}
