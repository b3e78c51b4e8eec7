//! Introspection seam: querying post-boot instance state.
//!
//! Every query is a pass-through to the remote transport; the scenario
//! engine only constructs the handle and hands it to bound tests.

use std::future::Future;
use std::sync::Arc;

use crate::config::ArgusConfig;
use crate::error::ArgusError;
use crate::remote::RemoteClient;
use crate::types::BoxFuture;

/// Construction parameters handed to every introspection variant.
#[derive(Clone)]
pub struct IntrospectionParams {
    /// Shared, read-only configuration
    pub config: Arc<ArgusConfig>,
    /// Remote client obtained from the backend
    pub remote_client: Arc<dyn RemoteClient>,
}

/// Post-boot instance queries.
pub trait Introspection: Send + Sync {
    /// Introspection variant name.
    fn name(&self) -> &str;

    /// The remote client queries run through.
    fn remote_client(&self) -> &Arc<dyn RemoteClient>;

    /// Operating system version string.
    fn os_version(&self) -> impl Future<Output = Result<String, ArgusError>> + Send;

    /// Trace lines left by the instance's user-data / config handlers.
    fn config_handler_traces(&self) -> impl Future<Output = Result<Vec<String>, ArgusError>> + Send;

    /// Entries of a remote directory.
    fn list_location(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<String>, ArgusError>> + Send;

    /// State of a service (e.g. `"Running"`, `"active"`).
    fn service_status(&self, name: &str)
    -> impl Future<Output = Result<String, ArgusError>> + Send;
}

/// dyn-compatible introspection, implemented for every [`Introspection`].
pub trait DynIntrospection: Send + Sync {
    /// Introspection variant name.
    fn name(&self) -> &str;

    /// The remote client queries run through.
    fn remote_client(&self) -> &Arc<dyn RemoteClient>;

    /// Operating system version string.
    fn os_version(&self) -> BoxFuture<'_, Result<String, ArgusError>>;

    /// Trace lines left by config handlers.
    fn config_handler_traces(&self) -> BoxFuture<'_, Result<Vec<String>, ArgusError>>;

    /// Entries of a remote directory.
    fn list_location<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Vec<String>, ArgusError>>;

    /// State of a service.
    fn service_status<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, ArgusError>>;
}

impl<T: Introspection> DynIntrospection for T {
    fn name(&self) -> &str {
        Introspection::name(self)
    }

    fn remote_client(&self) -> &Arc<dyn RemoteClient> {
        Introspection::remote_client(self)
    }

    fn os_version(&self) -> BoxFuture<'_, Result<String, ArgusError>> {
        Box::pin(Introspection::os_version(self))
    }

    fn config_handler_traces(&self) -> BoxFuture<'_, Result<Vec<String>, ArgusError>> {
        Box::pin(Introspection::config_handler_traces(self))
    }

    fn list_location<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Vec<String>, ArgusError>> {
        Box::pin(Introspection::list_location(self, path))
    }

    fn service_status<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, ArgusError>> {
        Box::pin(Introspection::service_status(self, name))
    }
}
