//! Fake collaborators for lifecycle tests.
//!
//! All fakes register under the variant name `"fake"` and record every call
//! into a shared [`CallLog`], so tests can assert the order of setup and
//! teardown steps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use argus_core::backend::{Backend, BackendParams, DynBackend};
use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, BackendError, RecipeError, RemoteError};
use argus_core::introspection::{DynIntrospection, Introspection, IntrospectionParams};
use argus_core::recipe::{DynRecipe, Recipe, RecipeParams};
use argus_core::remote::RemoteClient;
use argus_core::types::{BoxFuture, CommandOutput, CommandType, Credentials, Protocol};
use argus_scenario::{ScenarioDescriptor, VariantRegistry};
use bytes::Bytes;

/// Variant name every fake registers under.
pub const FAKE: &str = "fake";

/// Ordered record of collaborator calls.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl CallLog {
    fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// Recorded calls, in order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// How many times `entry` was recorded.
    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

/// Where the fake world should fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(dead_code)]
pub enum FailAt {
    #[default]
    Nowhere,
    Setup,
    Prepare,
    RemoteClient,
    Cleanup,
    SetupAndCleanup,
    SetupPanics,
    PreparePanics,
    CleanupPanics,
}

/// One fake environment: the registry plus everything it records.
#[derive(Clone, Default)]
pub struct FakeWorld {
    pub log: CallLog,
    pub fail_at: FailAt,
    pub cleanup_calls: Arc<AtomicUsize>,
    pub received_userdata: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl FakeWorld {
    /// A world where nothing fails.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// A world that fails at `fail_at`.
    pub fn failing(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            ..Self::default()
        }
    }

    /// Number of backend cleanups.
    pub fn cleanups(&self) -> usize {
        self.cleanup_calls.load(Ordering::SeqCst)
    }

    /// User data the backend was constructed with.
    pub fn userdata(&self) -> Option<String> {
        self.received_userdata.lock().unwrap().clone()
    }

    /// Registry with the fake backend, recipe and introspection.
    pub fn registry(&self) -> Arc<VariantRegistry> {
        let mut registry = VariantRegistry::new();

        let world = self.clone();
        registry
            .register_backend(FAKE, move |params: BackendParams| {
                *world.received_userdata.lock().unwrap() = params.userdata.clone();
                world.log.record("backend:new");
                Ok(Arc::new(FakeBackend {
                    params,
                    world: world.clone(),
                }) as Arc<dyn DynBackend>)
            })
            .unwrap();

        let world = self.clone();
        registry
            .register_recipe(FAKE, move |params: RecipeParams| {
                world.log.record("recipe:new");
                Ok(Box::new(FakeRecipe {
                    service_tag: params.service_tag,
                    world: world.clone(),
                }) as Box<dyn DynRecipe>)
            })
            .unwrap();

        let world = self.clone();
        registry
            .register_introspection(FAKE, move |params: IntrospectionParams| {
                world.log.record("introspection:new");
                Ok(Arc::new(FakeIntrospection {
                    client: params.remote_client,
                }) as Arc<dyn DynIntrospection>)
            })
            .unwrap();

        Arc::new(registry)
    }
}

/// A final descriptor wired to the fakes.
pub fn fake_descriptor(name: &str, groups: &[&str]) -> ScenarioDescriptor {
    ScenarioDescriptor::builder(name)
        .backend(FAKE)
        .introspection(FAKE)
        .recipe(FAKE)
        .test_groups(groups.iter().copied())
        .build()
}

struct FakeBackend {
    params: BackendParams,
    world: FakeWorld,
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        &self.params.name
    }

    fn config(&self) -> &ArgusConfig {
        &self.params.config
    }

    async fn setup_instance(&self) -> Result<(), ArgusError> {
        self.world.log.record("backend:setup");
        match self.world.fail_at {
            FailAt::Setup | FailAt::SetupAndCleanup => {
                Err(BackendError::Provision("quota exceeded".to_owned()).into())
            }
            FailAt::SetupPanics => panic!("hypervisor went away"),
            _ => Ok(()),
        }
    }

    fn remote_client(&self) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        self.world.log.record("backend:remote_client");
        if self.world.fail_at == FailAt::RemoteClient {
            return Err(RemoteError::UnsupportedProtocol("carrier pigeon".to_owned()).into());
        }
        Ok(Arc::new(EchoClient))
    }

    fn get_remote_client(
        &self,
        _credentials: &Credentials,
        _protocol: Protocol,
    ) -> Result<Arc<dyn RemoteClient>, ArgusError> {
        Ok(Arc::new(EchoClient))
    }

    fn internal_instance_id(&self) -> Result<String, ArgusError> {
        Ok(format!("fake-{}", self.params.name))
    }

    async fn instance_output(&self) -> Result<Bytes, ArgusError> {
        Ok(Bytes::from_static(b"console: boot finished\n"))
    }

    async fn cleanup(&self) -> Result<(), ArgusError> {
        self.world.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        self.world.log.record("backend:cleanup");
        match self.world.fail_at {
            FailAt::CleanupPanics => panic!("delete call crashed"),
            FailAt::Cleanup | FailAt::SetupAndCleanup => {
                Err(BackendError::Cleanup("instance stuck in deleting".to_owned()).into())
            }
            _ => Ok(()),
        }
    }
}

struct FakeRecipe {
    service_tag: String,
    world: FakeWorld,
}

impl Recipe for FakeRecipe {
    fn name(&self) -> &str {
        "fake-recipe"
    }

    async fn prepare(&self) -> Result<(), ArgusError> {
        self.world
            .log
            .record(format!("recipe:prepare:{}", self.service_tag));
        if self.world.fail_at == FailAt::PreparePanics {
            panic!("installer crashed");
        }
        if self.world.fail_at == FailAt::Prepare {
            return Err(RecipeError::StepFailed {
                step: "install-service".to_owned(),
                reason: "exit code 1603".to_owned(),
            }
            .into());
        }
        Ok(())
    }
}

/// Remote client that echoes the command back on stdout.
struct EchoClient;

impl RemoteClient for EchoClient {
    fn target(&self) -> String {
        "fake-host".to_owned()
    }

    fn run_command<'a>(
        &'a self,
        command: &'a str,
        _command_type: CommandType,
    ) -> BoxFuture<'a, Result<CommandOutput, ArgusError>> {
        Box::pin(async move {
            Ok(CommandOutput {
                stdout: command.to_owned(),
                stderr: String::new(),
                exit_code: 0,
            })
        })
    }
}

struct FakeIntrospection {
    client: Arc<dyn RemoteClient>,
}

impl Introspection for FakeIntrospection {
    fn name(&self) -> &str {
        "fake-introspection"
    }

    fn remote_client(&self) -> &Arc<dyn RemoteClient> {
        &self.client
    }

    async fn os_version(&self) -> Result<String, ArgusError> {
        Ok("FakeOS 10.0".to_owned())
    }

    async fn config_handler_traces(&self) -> Result<Vec<String>, ArgusError> {
        Ok(vec!["SetHostNamePlugin".to_owned()])
    }

    async fn list_location(&self, path: &str) -> Result<Vec<String>, ArgusError> {
        Ok(vec![format!("{path}/a"), format!("{path}/b")])
    }

    async fn service_status(&self, _name: &str) -> Result<String, ArgusError> {
        Ok("Running".to_owned())
    }
}
