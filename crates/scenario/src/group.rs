//! Capability test groups: reusable bundles of test methods.
//!
//! A group is plain data: a name plus test methods, each optionally tagged
//! with the service tag it requires. Groups are registered in a
//! [`GroupCatalog`] and later bound into suites by the
//! [`Composer`](crate::composer::Composer).
//!
//! Every invocation of a test method builds a fresh instance of its group
//! from the suite's [`TestContext`], then calls the method on it.
//!
//! # Example
//! ```
//! use argus_scenario::{CapabilityGroup, TestContext, TestGroup, TestResult};
//!
//! struct Smoke {
//!     ctx: TestContext,
//! }
//!
//! impl CapabilityGroup for Smoke {
//!     fn from_context(ctx: TestContext) -> Self {
//!         Self { ctx }
//!     }
//! }
//!
//! impl Smoke {
//!     async fn test_os_version(self) -> TestResult {
//!         let _version = self.ctx.introspection.os_version().await?;
//!         Ok(())
//!     }
//! }
//!
//! let group = TestGroup::builder::<Smoke>("Smoke")
//!     .test("test_os_version", Smoke::test_os_version)
//!     .build();
//! assert_eq!(group.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use argus_core::backend::DynBackend;
use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, ScenarioError};
use argus_core::introspection::DynIntrospection;
use argus_core::types::BoxFuture;

use crate::descriptor::ScenarioDescriptor;

/// Outcome of one test method.
pub type TestResult = Result<(), ArgusError>;

/// Zero-argument thunk (apart from the shared context) run for one test.
pub type TestBody = Arc<dyn Fn(TestContext) -> BoxFuture<'static, TestResult> + Send + Sync>;

/// Shared scenario state handed to every test method.
#[derive(Clone)]
pub struct TestContext {
    /// Resolved configuration
    pub config: Arc<ArgusConfig>,
    /// Live backend handle
    pub backend: Arc<dyn DynBackend>,
    /// Live introspection handle
    pub introspection: Arc<dyn DynIntrospection>,
    /// Bound name of the running test
    pub test_name: String,
    /// Service tag of the scenario
    pub service_tag: String,
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("backend", &self.backend.name())
            .field("introspection", &self.introspection.name())
            .field("test_name", &self.test_name)
            .field("service_tag", &self.service_tag)
            .finish()
    }
}

/// A capability test group type, constructed once per test invocation.
pub trait CapabilityGroup: Send + 'static {
    /// Build a fresh instance for one test invocation.
    fn from_context(ctx: TestContext) -> Self;
}

/// One test method of a group.
#[derive(Clone)]
pub struct TestMethod {
    name: String,
    required_service_tag: Option<String>,
    body: TestBody,
}

impl TestMethod {
    /// Original method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service tag this method requires, if any.
    pub fn required_service_tag(&self) -> Option<&str> {
        self.required_service_tag.as_deref()
    }

    /// Whether this method applies to a scenario with `service_tag`.
    pub fn applies_to(&self, service_tag: &str) -> bool {
        self.required_service_tag
            .as_deref()
            .is_none_or(|required| required == service_tag)
    }

    /// The thunk that builds the group and runs the method.
    pub fn body(&self) -> &TestBody {
        &self.body
    }
}

impl fmt::Debug for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod")
            .field("name", &self.name)
            .field("required_service_tag", &self.required_service_tag)
            .finish_non_exhaustive()
    }
}

/// A named set of test methods, kept in lexicographic order.
#[derive(Clone, Debug)]
pub struct TestGroup {
    name: String,
    methods: BTreeMap<String, TestMethod>,
}

impl TestGroup {
    /// Start building a group backed by the type `G`.
    pub fn builder<G: CapabilityGroup>(name: impl Into<String>) -> GroupBuilder<G> {
        GroupBuilder {
            name: name.into(),
            methods: BTreeMap::new(),
            _group: PhantomData,
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Test methods in lexicographic order.
    pub fn methods(&self) -> impl Iterator<Item = &TestMethod> {
        self.methods.values()
    }

    /// Look up a method by its original name.
    pub fn method(&self, name: &str) -> Option<&TestMethod> {
        self.methods.get(name)
    }

    /// Number of test methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the group has no test methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl AsRef<TestGroup> for TestGroup {
    fn as_ref(&self) -> &TestGroup {
        self
    }
}

/// Builder for [`TestGroup`].
///
/// Declaring a name twice replaces the earlier method.
pub struct GroupBuilder<G> {
    name: String,
    methods: BTreeMap<String, TestMethod>,
    _group: PhantomData<fn() -> G>,
}

impl<G: CapabilityGroup> GroupBuilder<G> {
    /// Add a test method that applies to every service tag.
    pub fn test<F, Fut>(self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(G) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.add(name.into(), None, method)
    }

    /// Add a test method that only applies to scenarios with `service_tag`.
    pub fn test_requiring<F, Fut>(
        self,
        name: impl Into<String>,
        service_tag: impl Into<String>,
        method: F,
    ) -> Self
    where
        F: Fn(G) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.add(name.into(), Some(service_tag.into()), method)
    }

    fn add<F, Fut>(mut self, name: String, required_service_tag: Option<String>, method: F) -> Self
    where
        F: Fn(G) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let body: TestBody = Arc::new(move |ctx: TestContext| {
            let fut: BoxFuture<'static, TestResult> = Box::pin(method(G::from_context(ctx)));
            fut
        });
        self.methods.insert(
            name.clone(),
            TestMethod {
                name,
                required_service_tag,
                body,
            },
        );
        self
    }

    /// Finish building.
    pub fn build(self) -> TestGroup {
        TestGroup {
            name: self.name,
            methods: self.methods,
        }
    }
}

/// Registry of capability test groups by name.
#[derive(Clone, Debug, Default)]
pub struct GroupCatalog {
    groups: BTreeMap<String, Arc<TestGroup>>,
}

impl GroupCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Names must be unique.
    pub fn register(&mut self, group: TestGroup) -> Result<(), ScenarioError> {
        if self.groups.contains_key(group.name()) {
            return Err(ScenarioError::DuplicateTestGroup(group.name().to_owned()));
        }
        tracing::debug!(group = group.name(), methods = group.len(), "test group registered");
        self.groups.insert(group.name().to_owned(), Arc::new(group));
        Ok(())
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<Arc<TestGroup>> {
        self.groups.get(name).cloned()
    }

    /// Resolve a descriptor's group list, keeping its order.
    pub fn resolve(
        &self,
        descriptor: &ScenarioDescriptor,
    ) -> Result<Vec<Arc<TestGroup>>, ScenarioError> {
        descriptor
            .test_groups
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| ScenarioError::UnknownTestGroup {
                    suite: descriptor.name.clone(),
                    group: name.clone(),
                })
            })
            .collect()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
