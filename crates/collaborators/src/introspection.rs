//! `windows` and `linux` introspection over a remote client.
//!
//! Every query is one remote command; parsing is kept in free functions so
//! it can be checked without an instance.

use std::fmt;
use std::sync::Arc;

use argus_core::config::ArgusConfig;
use argus_core::error::ArgusError;
use argus_core::introspection::{Introspection, IntrospectionParams};
use argus_core::remote::RemoteClient;
use argus_core::types::CommandType;

/// Variant name of the Windows introspection.
pub const WINDOWS_INTROSPECTION: &str = "windows";

/// Variant name of the Linux introspection.
pub const LINUX_INTROSPECTION: &str = "linux";

/// Guest operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Log line marker written by the init service for each handler it runs.
    pub fn handler_marker(self) -> &'static str {
        match self {
            Self::Windows => "Executing plugin",
            Self::Linux => "Running module",
        }
    }

    fn command_type(self) -> CommandType {
        match self {
            Self::Windows => CommandType::Powershell,
            Self::Linux => CommandType::Shell,
        }
    }

    fn init_log(self, config: &ArgusConfig) -> &str {
        match self {
            Self::Windows => &config.introspection.windows_init_log,
            Self::Linux => &config.introspection.linux_init_log,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "{WINDOWS_INTROSPECTION}"),
            Self::Linux => write!(f, "{LINUX_INTROSPECTION}"),
        }
    }
}

/// Introspection issuing PowerShell (Windows) or shell (Linux) queries.
pub struct RemoteIntrospection {
    platform: Platform,
    name: String,
    config: Arc<ArgusConfig>,
    client: Arc<dyn RemoteClient>,
}

impl RemoteIntrospection {
    pub fn new(platform: Platform, params: IntrospectionParams) -> Self {
        Self {
            platform,
            name: platform.to_string(),
            config: params.config,
            client: params.remote_client,
        }
    }

    /// Guest platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    async fn query(&self, command: &str) -> Result<String, ArgusError> {
        self.client
            .run_command_verbose(command, self.platform.command_type())
            .await
    }

    fn quote(&self, value: &str) -> String {
        match self.platform {
            Platform::Windows => format!("'{}'", value.replace('\'', "''")),
            Platform::Linux => format!("'{}'", value.replace('\'', r"'\''")),
        }
    }
}

/// Non-empty trimmed lines of `output`.
pub fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Handler trace lines: the text after `marker` on each line containing it,
/// without surrounding quotes.
pub fn parse_handler_traces(log: &str, marker: &str) -> Vec<String> {
    log.lines()
        .filter_map(|line| {
            let at = line.find(marker)?;
            Some(line[at + marker.len()..].trim_matches(|c: char| {
                c == ':' || c == '\'' || c.is_whitespace()
            }))
        })
        .filter(|trace| !trace.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Introspection for RemoteIntrospection {
    fn name(&self) -> &str {
        &self.name
    }

    fn remote_client(&self) -> &Arc<dyn RemoteClient> {
        &self.client
    }

    async fn os_version(&self) -> Result<String, ArgusError> {
        let command = match self.platform {
            Platform::Windows => "(Get-CimInstance Win32_OperatingSystem).Version",
            Platform::Linux => ". /etc/os-release && echo \"$PRETTY_NAME\"",
        };
        Ok(self.query(command).await?.trim().to_owned())
    }

    async fn config_handler_traces(&self) -> Result<Vec<String>, ArgusError> {
        let log = self.quote(self.platform.init_log(&self.config));
        let command = match self.platform {
            Platform::Windows => format!("Get-Content -Path {log}"),
            Platform::Linux => format!("cat {log}"),
        };
        let content = self.query(&command).await?;
        Ok(parse_handler_traces(&content, self.platform.handler_marker()))
    }

    async fn list_location(&self, path: &str) -> Result<Vec<String>, ArgusError> {
        let path = self.quote(path);
        let command = match self.platform {
            Platform::Windows => format!("Get-ChildItem -Name -Force -Path {path}"),
            Platform::Linux => format!("ls -1A {path}"),
        };
        Ok(parse_lines(&self.query(&command).await?))
    }

    async fn service_status(&self, name: &str) -> Result<String, ArgusError> {
        let quoted = self.quote(name);
        match self.platform {
            Platform::Windows => {
                let status = self
                    .query(&format!("(Get-Service -Name {quoted}).Status"))
                    .await?;
                Ok(status.trim().to_owned())
            }
            Platform::Linux => {
                // `is-active` exits non-zero for anything but active.
                let output = self
                    .client
                    .run_command(&format!("systemctl is-active {quoted}"), CommandType::Shell)
                    .await?;
                Ok(output.stdout.trim().to_owned())
            }
        }
    }
}
