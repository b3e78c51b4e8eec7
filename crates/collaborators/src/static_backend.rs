//! `static` backend: a pre-provisioned host reached over SSH.
//!
//! Nothing is created or destroyed. Setup only proves the host answers and
//! records its host name as the instance id; cleanup releases the handle.

use std::sync::{Arc, Mutex};

use argus_core::backend::{Backend, BackendParams};
use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, BackendError, ConfigError, RemoteError};
use argus_core::remote::RemoteClient;
use argus_core::types::{CommandType, Credentials, Protocol};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::ssh::SshRemoteClient;

/// Variant name.
pub const STATIC_BACKEND: &str = "static";

/// Backend for an already running host.
pub struct StaticBackend {
    params: BackendParams,
    client_override: Option<Arc<dyn RemoteClient>>,
    instance_id: Mutex<Option<String>>,
}

impl StaticBackend {
    /// Backend reaching the host through SSH.
    pub fn new(params: BackendParams) -> Self {
        Self {
            params,
            client_override: None,
            instance_id: Mutex::new(None),
        }
    }

    /// Backend reaching the host through a given client.
    pub fn with_client(params: BackendParams, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client_override: Some(client),
            ..Self::new(params)
        }
    }

    fn platform(&self) -> &str {
        &self.params.config.static_backend.platform
    }

    fn credentials(&self) -> Result<&Credentials, ArgusError> {
        let platform = self.platform();
        self.params.config.credentials_for(platform).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: format!("credentials.{platform}"),
                reason: "no credentials configured for the static host platform".to_owned(),
            }
            .into()
        })
    }

    fn recorded_id(&self) -> Option<String> {
        self.instance_id
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn console_read_command(&self, path: &str) -> (String, CommandType) {
        if self.platform() == "windows" {
            (
                format!("Get-Content -Raw -Path '{}'", path.replace('\'', "''")),
                CommandType::Powershell,
            )
        } else {
            (
                format!("cat '{}'", path.replace('\'', r"'\''")),
                CommandType::Shell,
            )
        }
    }
}

impl Backend for StaticBackend {
    fn name(&self) -> &str {
        &self.params.name
    }

    fn config(&self) -> &ArgusConfig {
        &self.params.config
    }

    async fn setup_instance(&self) -> Result<(), ArgusError> {
        if self.params.userdata.is_some() {
            warn!(
                instance = %self.params.name,
                "static hosts cannot receive user data; ignoring it"
            );
        }
        if !self.params.metadata.is_empty() {
            warn!(
                instance = %self.params.name,
                keys = self.params.metadata.len(),
                "static hosts cannot receive metadata; ignoring it"
            );
        }
        if let Some(zone) = &self.params.availability_zone {
            debug!(zone = %zone, "availability zone has no meaning for static hosts");
        }

        let client = self.remote_client()?;
        let hostname = client
            .run_command_verbose("hostname", CommandType::Shell)
            .await
            .map_err(|e| BackendError::Provision(format!("host did not answer: {e}")))?;
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(BackendError::Provision("host reported an empty host name".to_owned()).into());
        }

        info!(instance = %self.params.name, host = hostname, "static host reachable");
        let mut guard = self
            .instance_id
            .lock()
            .map_err(|_| BackendError::Provision("instance id lock poisoned".to_owned()))?;
        *guard = Some(hostname.to_owned());
        Ok(())
    }

    fn remote_client(&self) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        if let Some(client) = &self.client_override {
            return Ok(Arc::clone(client));
        }
        let credentials = self.credentials()?.clone();
        self.get_remote_client(&credentials, Protocol::Ssh)
    }

    fn get_remote_client(
        &self,
        credentials: &Credentials,
        protocol: Protocol,
    ) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        match protocol {
            Protocol::Ssh => Ok(Arc::new(SshRemoteClient::new(
                &self.params.config.static_backend,
                credentials,
            ))),
            Protocol::WinRm => Err(RemoteError::UnsupportedProtocol(protocol.to_string()).into()),
        }
    }

    fn internal_instance_id(&self) -> Result<String, ArgusError> {
        self.recorded_id()
            .ok_or_else(|| BackendError::NotProvisioned.into())
    }

    async fn instance_output(&self) -> Result<Bytes, ArgusError> {
        let path = &self.params.config.static_backend.console_log_path;
        if path.is_empty() {
            return Ok(Bytes::new());
        }
        let (command, command_type) = self.console_read_command(path);
        let output = self
            .remote_client()?
            .run_command_verbose(&command, command_type)
            .await
            .map_err(|e| BackendError::Output(format!("reading {path}: {e}")))?;
        Ok(Bytes::from(output))
    }

    async fn cleanup(&self) -> Result<(), ArgusError> {
        let released = self
            .instance_id
            .lock()
            .map_err(|_| BackendError::Cleanup("instance id lock poisoned".to_owned()))?
            .take();
        match released {
            Some(host) => info!(instance = %self.params.name, host = %host, "static host released"),
            None => debug!(instance = %self.params.name, "static host was never reached"),
        }
        Ok(())
    }
}
