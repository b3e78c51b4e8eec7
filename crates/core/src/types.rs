//! Shared domain types used by collaborators and the scenario engine.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boxed future used by the dyn-compatible collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Credentials for reaching an instance.
///
/// `password` can be omitted when key based authentication is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Login user name
    pub username: String,
    /// Optional password
    pub password: Option<String>,
    /// Optional private key file
    pub private_key_path: Option<PathBuf>,
}

/// Remote access protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// OpenSSH
    Ssh,
    /// Windows Remote Management
    WinRm,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssh => write!(f, "ssh"),
            Self::WinRm => write!(f, "winrm"),
        }
    }
}

/// How a remote command line is interpreted on the instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// POSIX shell (default)
    #[default]
    Shell,
    /// Windows `cmd.exe`
    Cmd,
    /// Windows PowerShell
    Powershell,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell => write!(f, "shell"),
            Self::Cmd => write!(f, "cmd"),
            Self::Powershell => write!(f, "powershell"),
        }
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shell" => Ok(Self::Shell),
            "cmd" => Ok(Self::Cmd),
            "powershell" => Ok(Self::Powershell),
            other => Err(format!(
                "unknown command type '{other}', expected shell, cmd or powershell"
            )),
        }
    }
}

/// Result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Process exit code (`-1` when terminated by a signal)
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the command exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
