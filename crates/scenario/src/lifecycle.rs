//! Scenario lifecycle: one-time setup before a suite's tests, one-time
//! teardown after.
//!
//! # Setup
//! ```text
//! Uninitialized → Provisioning → Preparing → Introspecting → Ready
//!                      │              │             │
//!                      └──────────────┴─────────────┴──→ Failed → TearingDown → TornDown
//! ```
//!
//! On any stage failure the orchestrator logs the error with the suite and
//! stage, tears down whatever was built and returns the stage error. A
//! cleanup failure during that rollback is logged but never replaces the
//! original error.
//!
//! Every collaborator call runs behind a panic boundary: a panicking backend,
//! recipe or introspection fails its stage like any other error, so rollback
//! still runs and sibling suites are unaffected.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use argus_core::backend::{BackendParams, DynBackend};
use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, BackendError, ScenarioError};
use argus_core::introspection::{DynIntrospection, IntrospectionParams};
use argus_core::metrics as m;
use argus_core::recipe::{DynRecipe, RecipeParams};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::descriptor::ScenarioDescriptor;
use crate::group::TestContext;
use crate::variants::VariantRegistry;

/// Lifecycle state of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing built yet
    Uninitialized,
    /// Backend being built and booted
    Provisioning,
    /// Recipe running against the instance
    Preparing,
    /// Introspection handle being built
    Introspecting,
    /// All handles live; tests may run
    Ready,
    /// A setup stage failed
    Failed,
    /// Cleanup in progress
    TearingDown,
    /// Cleanup done; handles released
    TornDown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Provisioning => "provisioning",
            Self::Preparing => "preparing",
            Self::Introspecting => "introspecting",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::TearingDown => "tearing-down",
            Self::TornDown => "torn-down",
        };
        f.write_str(s)
    }
}

/// Setup stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStage {
    Provisioning,
    Preparing,
    Introspecting,
}

impl SetupStage {
    /// Stage label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Preparing => "preparing",
            Self::Introspecting => "introspecting",
        }
    }

    fn into_error(self, suite: String, source: ArgusError) -> ScenarioError {
        let source = Box::new(source);
        match self {
            Self::Provisioning => ScenarioError::Provision { suite, source },
            Self::Preparing => ScenarioError::Prepare { suite, source },
            Self::Introspecting => ScenarioError::IntrospectionSetup { suite, source },
        }
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode raw user data the way backends expect it.
pub fn encode_userdata(userdata: &[u8]) -> String {
    STANDARD.encode(userdata)
}

/// Drives setup and teardown of one scenario's collaborators.
pub struct LifecycleOrchestrator {
    descriptor: Arc<ScenarioDescriptor>,
    config: Arc<ArgusConfig>,
    variants: Arc<VariantRegistry>,
    state: LifecycleState,
    failed_stage: Option<SetupStage>,
    backend: Option<Arc<dyn DynBackend>>,
    recipe: Option<Arc<dyn DynRecipe>>,
    introspection: Option<Arc<dyn DynIntrospection>>,
    cleanup_invoked: bool,
}

impl LifecycleOrchestrator {
    /// Orchestrator for `descriptor`; nothing is built until setup.
    pub fn new(
        descriptor: Arc<ScenarioDescriptor>,
        config: Arc<ArgusConfig>,
        variants: Arc<VariantRegistry>,
    ) -> Self {
        Self {
            descriptor,
            config,
            variants,
            state: LifecycleState::Uninitialized,
            failed_stage: None,
            backend: None,
            recipe: None,
            introspection: None,
            cleanup_invoked: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Stage that failed during setup, if any.
    pub fn failed_stage(&self) -> Option<SetupStage> {
        self.failed_stage
    }

    /// Scenario name.
    pub fn suite(&self) -> &str {
        &self.descriptor.name
    }

    /// Live backend handle, if built.
    pub fn backend(&self) -> Option<&Arc<dyn DynBackend>> {
        self.backend.as_ref()
    }

    /// Live introspection handle, if built.
    pub fn introspection(&self) -> Option<&Arc<dyn DynIntrospection>> {
        self.introspection.as_ref()
    }

    /// Build, prepare and introspect the instance.
    ///
    /// Runs at most once. On failure everything built so far is torn down
    /// and the failing stage's error is returned.
    pub async fn set_up_once(&mut self) -> Result<(), ScenarioError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(self.invalid_state("uninitialized"));
        }
        let missing = self.descriptor.missing_fields();
        if !missing.is_empty() {
            return Err(ScenarioError::DescriptorNotFinal {
                suite: self.suite().to_owned(),
                missing: missing.join(", "),
            });
        }

        let started = Instant::now();
        info!(suite = self.suite(), "setting up scenario");
        self.ensure_output_directory().await;

        match self.run_stages().await {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                let elapsed = started.elapsed().as_secs_f64();
                metrics::histogram!(m::LIFECYCLE_SETUP_DURATION_SECONDS).record(elapsed);
                info!(suite = self.suite(), elapsed_secs = elapsed, "scenario ready");
                Ok(())
            }
            Err((stage, source)) => {
                error!(
                    suite = self.suite(),
                    stage = %stage,
                    error = %source,
                    "building scenario failed"
                );
                metrics::counter!(m::LIFECYCLE_SETUP_FAILURES_TOTAL, m::LABEL_STAGE => stage.as_str())
                    .increment(1);
                self.state = LifecycleState::Failed;
                self.failed_stage = Some(stage);

                if let Err(cleanup_err) = self.tear_down_once().await {
                    error!(
                        suite = self.suite(),
                        setup_error = %source,
                        cleanup_error = %cleanup_err,
                        "cleanup after failed setup also failed"
                    );
                }
                Err(stage.into_error(self.suite().to_owned(), source))
            }
        }
    }

    /// Shared context for one test. Only available once ready.
    pub fn context(&self, test_name: &str) -> Result<TestContext, ScenarioError> {
        match (self.state, &self.backend, &self.introspection) {
            (LifecycleState::Ready, Some(backend), Some(introspection)) => Ok(TestContext {
                config: Arc::clone(&self.config),
                backend: Arc::clone(backend),
                introspection: Arc::clone(introspection),
                test_name: test_name.to_owned(),
                service_tag: self.descriptor.service_tag.clone(),
            }),
            _ => Err(self.invalid_state("ready")),
        }
    }

    /// Release the instance. Runs at most once; later calls are no-ops.
    pub async fn tear_down_once(&mut self) -> Result<(), ScenarioError> {
        if self.cleanup_invoked {
            debug!(suite = self.suite(), "teardown already done");
            return Ok(());
        }
        self.cleanup_invoked = true;
        self.state = LifecycleState::TearingDown;

        let result = match &self.backend {
            Some(backend) => {
                info!(suite = self.suite(), backend = backend.name(), "cleaning up instance");
                let backend = Arc::clone(backend);
                isolated(async move { backend.cleanup().await }).await
            }
            None => {
                debug!(suite = self.suite(), "no backend built, nothing to clean up");
                Ok(())
            }
        };

        self.introspection = None;
        self.recipe = None;
        self.backend = None;
        self.state = LifecycleState::TornDown;

        result.map_err(|source| {
            warn!(suite = self.suite(), error = %source, "instance cleanup failed");
            metrics::counter!(m::LIFECYCLE_CLEANUP_FAILURES_TOTAL).increment(1);
            ScenarioError::Cleanup {
                suite: self.suite().to_owned(),
                source: Box::new(source),
            }
        })
    }

    async fn run_stages(&mut self) -> Result<(), (SetupStage, ArgusError)> {
        self.state = LifecycleState::Provisioning;
        self.provision()
            .await
            .map_err(|e| (SetupStage::Provisioning, e))?;

        self.state = LifecycleState::Preparing;
        self.prepare().await.map_err(|e| (SetupStage::Preparing, e))?;

        self.state = LifecycleState::Introspecting;
        self.introspect()
            .map_err(|e| (SetupStage::Introspecting, e))?;
        Ok(())
    }

    async fn provision(&mut self) -> Result<(), ArgusError> {
        let variant = self.descriptor.backend.as_deref().unwrap_or_default();
        let params = BackendParams {
            config: Arc::clone(&self.config),
            name: self.descriptor.name.clone(),
            userdata: self
                .descriptor
                .userdata
                .as_deref()
                .filter(|raw| !raw.is_empty())
                .map(encode_userdata),
            metadata: self.descriptor.metadata.clone(),
            availability_zone: self.descriptor.availability_zone.clone(),
        };
        let variants = Arc::clone(&self.variants);
        let backend = isolated_sync(|| variants.build_backend(variant, params))?;
        // Stored before booting so a partial provision still gets cleaned up.
        self.backend = Some(Arc::clone(&backend));

        debug!(suite = self.suite(), backend = backend.name(), "provisioning instance");
        isolated(async move { backend.setup_instance().await }).await
    }

    async fn prepare(&mut self) -> Result<(), ArgusError> {
        let backend = self.live_backend()?;
        let variant = self.descriptor.recipe.as_deref().unwrap_or_default();
        let params = RecipeParams {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&backend),
            service_tag: self.descriptor.service_tag.clone(),
        };
        let variants = Arc::clone(&self.variants);
        let recipe: Arc<dyn DynRecipe> =
            Arc::from(isolated_sync(|| variants.build_recipe(variant, params))?);

        debug!(suite = self.suite(), recipe = recipe.name(), "preparing instance");
        self.recipe = Some(Arc::clone(&recipe));
        isolated(async move { recipe.prepare().await }).await?;
        isolated(async move { backend.save_instance_output(None).await }).await
    }

    fn introspect(&mut self) -> Result<(), ArgusError> {
        let backend = self.live_backend()?;
        let remote_client = isolated_sync(|| backend.remote_client())?;
        let variant = self.descriptor.introspection.as_deref().unwrap_or_default();
        let params = IntrospectionParams {
            config: Arc::clone(&self.config),
            remote_client,
        };
        let variants = Arc::clone(&self.variants);
        let introspection = isolated_sync(|| variants.build_introspection(variant, params))?;
        debug!(
            suite = self.suite(),
            introspection = introspection.name(),
            "introspection ready"
        );
        self.introspection = Some(introspection);
        Ok(())
    }

    async fn ensure_output_directory(&self) {
        let Some(dir) = self.config.output_directory() else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(
                path = %dir.display(),
                error = %e,
                "could not create output directory"
            );
        }
    }

    fn live_backend(&self) -> Result<Arc<dyn DynBackend>, ArgusError> {
        self.backend
            .clone()
            .ok_or_else(|| BackendError::NotProvisioned.into())
    }

    fn invalid_state(&self, expected: &str) -> ScenarioError {
        ScenarioError::InvalidState {
            suite: self.suite().to_owned(),
            expected: expected.to_owned(),
            actual: self.state.to_string(),
        }
    }
}

/// Run an async collaborator call on its own task, turning a panic into an error.
async fn isolated<T, F>(call: F) -> Result<T, ArgusError>
where
    F: Future<Output = Result<T, ArgusError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => Err(ArgusError::TaskFailed(format!(
            "panicked: {}",
            panic_message(join_err.into_panic())
        ))),
        Err(join_err) => Err(ArgusError::TaskFailed(join_err.to_string())),
    }
}

/// Synchronous counterpart of [`isolated`] for factories and handle lookups.
fn isolated_sync<T>(call: impl FnOnce() -> Result<T, ArgusError>) -> Result<T, ArgusError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(ArgusError::TaskFailed(format!(
            "panicked: {}",
            panic_message(payload)
        )))
    })
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

impl fmt::Debug for LifecycleOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleOrchestrator")
            .field("suite", &self.descriptor.name)
            .field("state", &self.state)
            .field("failed_stage", &self.failed_stage)
            .field("cleanup_invoked", &self.cleanup_invoked)
            .finish_non_exhaustive()
    }
}
