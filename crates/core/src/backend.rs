//! Backend seam: building, inspecting and destroying the instance under test.
//!
//! A *backend* manages the underlying instance, be it a cloud instance, a
//! pre-provisioned host or a local VM. [`Backend`] uses RPITIT and is not
//! dyn-compatible; every `Backend` is automatically a [`DynBackend`], which
//! the scenario engine stores as `Arc<dyn DynBackend>`.
//!
//! # Lifecycle
//! ```text
//! new(params) → setup_instance() → [remote_client / save_instance_output]* → cleanup()
//! ```
//!
//! All methods take `&self`: the live handle is shared with the recipe and
//! with every bound test, so implementations keep their mutable state behind
//! interior mutability.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::ArgusConfig;
use crate::error::{ArgusError, BackendError};
use crate::remote::RemoteClient;
use crate::types::{BoxFuture, Credentials, Protocol};

/// Construction parameters handed to every backend variant.
#[derive(Debug, Clone)]
pub struct BackendParams {
    /// Shared, read-only configuration
    pub config: Arc<ArgusConfig>,
    /// Instance name (the scenario name)
    pub name: String,
    /// User data, already base64-encoded by the orchestrator
    pub userdata: Option<String>,
    /// Metadata exposed to the instance's init service
    pub metadata: BTreeMap<String, String>,
    /// Availability zone to place the instance in
    pub availability_zone: Option<String>,
}

/// Instance lifecycle operations.
///
/// # Example
/// ```ignore
/// struct MyBackend { params: BackendParams }
///
/// impl Backend for MyBackend {
///     fn name(&self) -> &str { &self.params.name }
///     fn config(&self) -> &ArgusConfig { &self.params.config }
///     async fn setup_instance(&self) -> Result<(), ArgusError> { Ok(()) }
///     // ...
/// }
/// ```
pub trait Backend: Send + Sync {
    /// Instance name.
    fn name(&self) -> &str;

    /// Configuration the backend was built with.
    fn config(&self) -> &ArgusConfig;

    /// Create the underlying instance and wait until it is reachable.
    fn setup_instance(&self) -> impl Future<Output = Result<(), ArgusError>> + Send;

    /// Remote client using the backend's predefined credentials.
    fn remote_client(&self) -> Result<Arc<dyn RemoteClient>, ArgusError>;

    /// Remote client with explicit credentials and protocol.
    fn get_remote_client(
        &self,
        credentials: &Credentials,
        protocol: Protocol,
    ) -> Result<Arc<dyn RemoteClient>, ArgusError>;

    /// Identifier of the instance inside the backend.
    fn internal_instance_id(&self) -> Result<String, ArgusError>;

    /// Console output of the instance, empty when there is none.
    fn instance_output(&self) -> impl Future<Output = Result<Bytes, ArgusError>> + Send;

    /// Save the console output under the configured output directory.
    ///
    /// The file is `<instance id>.log`, or `<instance id>-<suffix>.log`.
    fn save_instance_output(
        &self,
        suffix: Option<&str>,
    ) -> impl Future<Output = Result<(), ArgusError>> + Send {
        async move {
            let Some(dir) = self.config().output_directory() else {
                return Ok(());
            };
            let instance_id = self.internal_instance_id()?;
            let content = self.instance_output().await?;
            write_instance_output(dir, &instance_id, suffix, &content).await
        }
    }

    /// Destroy every resource created by [`Backend::setup_instance`].
    ///
    /// Must be safe to call on a partially provisioned instance.
    fn cleanup(&self) -> impl Future<Output = Result<(), ArgusError>> + Send;
}

/// dyn-compatible backend.
///
/// [`Backend`] uses RPITIT, so `dyn Backend` is impossible. `DynBackend`
/// returns [`BoxFuture`] and is implemented for every `Backend`.
pub trait DynBackend: Send + Sync {
    /// Instance name.
    fn name(&self) -> &str;

    /// Configuration the backend was built with.
    fn config(&self) -> &ArgusConfig;

    /// Create the underlying instance.
    fn setup_instance(&self) -> BoxFuture<'_, Result<(), ArgusError>>;

    /// Remote client with predefined credentials.
    fn remote_client(&self) -> Result<Arc<dyn RemoteClient>, ArgusError>;

    /// Remote client with explicit credentials and protocol.
    fn get_remote_client(
        &self,
        credentials: &Credentials,
        protocol: Protocol,
    ) -> Result<Arc<dyn RemoteClient>, ArgusError>;

    /// Identifier of the instance inside the backend.
    fn internal_instance_id(&self) -> Result<String, ArgusError>;

    /// Console output of the instance.
    fn instance_output(&self) -> BoxFuture<'_, Result<Bytes, ArgusError>>;

    /// Save the console output for diagnostics.
    fn save_instance_output<'a>(
        &'a self,
        suffix: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), ArgusError>>;

    /// Destroy the instance.
    fn cleanup(&self) -> BoxFuture<'_, Result<(), ArgusError>>;
}

impl<T: Backend> DynBackend for T {
    fn name(&self) -> &str {
        Backend::name(self)
    }

    fn config(&self) -> &ArgusConfig {
        Backend::config(self)
    }

    fn setup_instance(&self) -> BoxFuture<'_, Result<(), ArgusError>> {
        Box::pin(Backend::setup_instance(self))
    }

    fn remote_client(&self) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        Backend::remote_client(self)
    }

    fn get_remote_client(
        &self,
        credentials: &Credentials,
        protocol: Protocol,
    ) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        Backend::get_remote_client(self, credentials, protocol)
    }

    fn internal_instance_id(&self) -> Result<String, ArgusError> {
        Backend::internal_instance_id(self)
    }

    fn instance_output(&self) -> BoxFuture<'_, Result<Bytes, ArgusError>> {
        Box::pin(Backend::instance_output(self))
    }

    fn save_instance_output<'a>(
        &'a self,
        suffix: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), ArgusError>> {
        Box::pin(Backend::save_instance_output(self, suffix))
    }

    fn cleanup(&self) -> BoxFuture<'_, Result<(), ArgusError>> {
        Box::pin(Backend::cleanup(self))
    }
}

/// File name for a saved console log.
pub fn instance_log_name(instance_id: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => format!("{instance_id}-{suffix}.log"),
        _ => format!("{instance_id}.log"),
    }
}

/// Write console output to `<dir>/<instance log name>`.
///
/// Blank output is not written.
pub async fn write_instance_output(
    dir: &Path,
    instance_id: &str,
    suffix: Option<&str>,
    content: &[u8],
) -> Result<(), ArgusError> {
    if content.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!(instance = instance_id, "empty console output; nothing to save");
        return Ok(());
    }

    let path = dir.join(instance_log_name(instance_id, suffix));
    tracing::info!(path = %path.display(), "saving instance console output");
    tokio::fs::write(&path, content).await.map_err(|e| {
        BackendError::Output(format!("failed to write {}: {}", path.display(), e)).into()
    })
}
