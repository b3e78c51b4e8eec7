#![doc = include_str!("../README.md")]

pub mod composer;
pub mod descriptor;
pub mod group;
pub mod lifecycle;
pub mod runner;
pub mod suite;
pub mod variants;

pub use composer::{Composer, compose_into};
pub use descriptor::{DEFAULT_SERVICE_TAG, ScenarioDescriptor, ScenarioDescriptorBuilder};
pub use group::{
    CapabilityGroup, GroupBuilder, GroupCatalog, TestBody, TestContext, TestGroup, TestMethod,
    TestResult,
};
pub use lifecycle::{LifecycleOrchestrator, LifecycleState, SetupStage, encode_userdata};
pub use runner::{SuiteReport, SuiteRun, SuiteRunner, TestOutcome, TestStatus};
pub use suite::{BoundTestMethod, Origin, RESERVED_NAMES, RunnableSuite};
pub use variants::VariantRegistry;
