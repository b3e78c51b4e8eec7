//! Recipe seam: customizing a freshly booted instance before tests run.

use std::future::Future;
use std::sync::Arc;

use crate::backend::DynBackend;
use crate::config::ArgusConfig;
use crate::error::ArgusError;
use crate::types::BoxFuture;

/// Construction parameters handed to every recipe variant.
#[derive(Clone)]
pub struct RecipeParams {
    /// Shared, read-only configuration
    pub config: Arc<ArgusConfig>,
    /// Live backend handle for the instance being prepared
    pub backend: Arc<dyn DynBackend>,
    /// Service tag of the scenario (e.g. `"http"`)
    pub service_tag: String,
}

/// Instance preparation.
pub trait Recipe: Send + Sync {
    /// Recipe name for logging.
    fn name(&self) -> &str;

    /// Prepare the instance. Runs once, after the backend's setup.
    fn prepare(&self) -> impl Future<Output = Result<(), ArgusError>> + Send;
}

/// dyn-compatible recipe, implemented for every [`Recipe`].
pub trait DynRecipe: Send + Sync {
    /// Recipe name for logging.
    fn name(&self) -> &str;

    /// Prepare the instance.
    fn prepare(&self) -> BoxFuture<'_, Result<(), ArgusError>>;
}

impl<T: Recipe> DynRecipe for T {
    fn name(&self) -> &str {
        Recipe::name(self)
    }

    fn prepare(&self) -> BoxFuture<'_, Result<(), ArgusError>> {
        Box::pin(Recipe::prepare(self))
    }
}
