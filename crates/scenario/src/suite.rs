//! Runnable suites: a descriptor plus its bound test methods.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use argus_core::error::ScenarioError;
use argus_core::types::BoxFuture;
use serde::Serialize;

use crate::descriptor::ScenarioDescriptor;
use crate::group::{TestBody, TestContext, TestResult};

/// Names of the suite surface; bound tests never take them as-is.
pub const RESERVED_NAMES: &[&str] = &[
    "set_up_once",
    "tear_down_once",
    "prepare_instance",
    "run",
    "test_names",
];

/// Where a bound test method came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Defined directly on the suite
    Suite,
    /// Bound from a capability test group
    Group { group: String, method: String },
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suite => write!(f, "suite"),
            Self::Group { group, method } => write!(f, "{group}::{method}"),
        }
    }
}

/// A test method bound into a suite under its final name.
#[derive(Clone)]
pub struct BoundTestMethod {
    name: String,
    origin: Origin,
    body: TestBody,
}

impl BoundTestMethod {
    pub(crate) fn new(name: String, origin: Origin, body: TestBody) -> Self {
        Self { name, origin, body }
    }

    /// Final name in the suite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provenance.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Start the test with the suite's shared context.
    pub fn invoke(&self, ctx: TestContext) -> BoxFuture<'static, TestResult> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for BoundTestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTestMethod")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// A scenario descriptor with its test methods, ready to run.
#[derive(Debug, Clone)]
pub struct RunnableSuite {
    descriptor: Arc<ScenarioDescriptor>,
    tests: BTreeMap<String, BoundTestMethod>,
    diagnostics: Vec<String>,
}

impl RunnableSuite {
    /// An empty suite for `descriptor`.
    pub fn new(descriptor: ScenarioDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            tests: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Suite name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The descriptor this suite was built from.
    pub fn descriptor(&self) -> &Arc<ScenarioDescriptor> {
        &self.descriptor
    }

    /// Whether the descriptor is not final; such suites never run.
    pub fn is_abstract(&self) -> bool {
        !self.descriptor.is_final()
    }

    /// Whether `name` is taken, by a reserved name or a bound test.
    pub fn has_attribute(&self, name: &str) -> bool {
        RESERVED_NAMES.contains(&name) || self.tests.contains_key(name)
    }

    /// Define a test directly on the suite.
    pub fn define_test<F, Fut>(&mut self, name: impl Into<String>, test: F) -> Result<(), ScenarioError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let name = name.into();
        if self.has_attribute(&name) {
            return Err(ScenarioError::CompositionDefect {
                suite: self.name().to_owned(),
                name: name.clone(),
                group: self.name().to_owned(),
            });
        }
        let body: TestBody = Arc::new(move |ctx: TestContext| {
            let fut: BoxFuture<'static, TestResult> = Box::pin(test(ctx));
            fut
        });
        self.tests
            .insert(name.clone(), BoundTestMethod::new(name, Origin::Suite, body));
        Ok(())
    }

    /// Bound test names, sorted.
    pub fn test_names(&self) -> Vec<&str> {
        self.tests.keys().map(String::as_str).collect()
    }

    /// Look up a bound test.
    pub fn get(&self, name: &str) -> Option<&BoundTestMethod> {
        self.tests.get(name)
    }

    /// Bound tests, sorted by name.
    pub fn tests(&self) -> impl Iterator<Item = &BoundTestMethod> {
        self.tests.values()
    }

    /// Number of bound tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no test is bound.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Notes left by composition (e.g. why the suite is empty).
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub(crate) fn bound(&self) -> &BTreeMap<String, BoundTestMethod> {
        &self.tests
    }

    pub(crate) fn replace_bound(&mut self, tests: BTreeMap<String, BoundTestMethod>) {
        self.tests = tests;
    }

    pub(crate) fn push_diagnostic(&mut self, note: String) {
        if !self.diagnostics.contains(&note) {
            self.diagnostics.push(note);
        }
    }
}
