//! Lifecycle: one-time setup, rollback on failure, exactly-once teardown.

use std::sync::Arc;

use crate::helpers::fakes::*;

use argus_core::config::ArgusConfig;
use argus_core::error::{ArgusError, BackendError, ScenarioError};
use argus_scenario::{LifecycleOrchestrator, LifecycleState, SetupStage};

fn orchestrator(world: &FakeWorld) -> LifecycleOrchestrator {
    let descriptor = fake_descriptor("S", &["G1"]).with_userdata("#ps1\necho hi");
    LifecycleOrchestrator::new(
        Arc::new(descriptor),
        Arc::new(ArgusConfig::default()),
        world.registry(),
    )
}

#[tokio::test]
async fn test_setup_runs_stages_in_order() {
    // Given: a world where nothing fails
    let world = FakeWorld::healthy();
    let mut orch = orchestrator(&world);

    // When
    orch.set_up_once().await.unwrap();

    // Then: provision, prepare, introspect, in that order
    assert_eq!(orch.state(), LifecycleState::Ready);
    assert_eq!(
        world.log.entries(),
        vec![
            "backend:new",
            "backend:setup",
            "recipe:new",
            "recipe:prepare:http",
            "backend:remote_client",
            "introspection:new",
        ]
    );
    assert!(orch.backend().is_some());
    assert!(orch.introspection().is_some());
}

#[tokio::test]
async fn test_userdata_reaches_backend_encoded() {
    let world = FakeWorld::healthy();
    let mut orch = orchestrator(&world);

    orch.set_up_once().await.unwrap();

    assert_eq!(world.userdata().as_deref(), Some("I3BzMQplY2hvIGhp"));
}

#[tokio::test]
async fn test_context_shares_live_handles() {
    let world = FakeWorld::healthy();
    let mut orch = orchestrator(&world);
    orch.set_up_once().await.unwrap();

    let ctx = orch.context("test_os").unwrap();

    assert_eq!(ctx.test_name, "test_os");
    assert_eq!(ctx.service_tag, "http");
    assert_eq!(ctx.introspection.os_version().await.unwrap(), "FakeOS 10.0");
    assert_eq!(ctx.backend.internal_instance_id().unwrap(), "fake-S");
}

#[tokio::test]
async fn test_provision_failure_cleans_up_once_and_reraises() {
    // Given: a backend that fails to boot
    let world = FakeWorld::failing(FailAt::Setup);
    let mut orch = orchestrator(&world);

    // When
    let err = orch.set_up_once().await.unwrap_err();

    // Then: provisioning error, cleanup ran exactly once, recipe never built
    assert!(matches!(err, ScenarioError::Provision { .. }));
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(world.cleanups(), 1);
    assert_eq!(world.log.count("recipe:new"), 0);
    assert_eq!(orch.failed_stage(), Some(SetupStage::Provisioning));
    assert_eq!(orch.state(), LifecycleState::TornDown);

    // When: the outer harness still calls teardown
    orch.tear_down_once().await.unwrap();

    // Then: no second cleanup
    assert_eq!(world.cleanups(), 1);
}

#[tokio::test]
async fn test_prepare_failure_reports_prepare_stage() {
    let world = FakeWorld::failing(FailAt::Prepare);
    let mut orch = orchestrator(&world);

    let err = orch.set_up_once().await.unwrap_err();

    assert_eq!(err.stage(), Some("preparing"));
    assert!(err.to_string().contains("install-service"));
    assert_eq!(world.cleanups(), 1);
    assert_eq!(world.log.count("introspection:new"), 0);
}

#[tokio::test]
async fn test_remote_client_failure_reports_introspection_stage() {
    let world = FakeWorld::failing(FailAt::RemoteClient);
    let mut orch = orchestrator(&world);

    let err = orch.set_up_once().await.unwrap_err();

    assert!(matches!(err, ScenarioError::IntrospectionSetup { .. }));
    assert_eq!(world.cleanups(), 1);
    assert!(orch.introspection().is_none());
}

#[tokio::test]
async fn test_cleanup_error_does_not_mask_setup_error() {
    // Given: setup and cleanup both fail
    let world = FakeWorld::failing(FailAt::SetupAndCleanup);
    let mut orch = orchestrator(&world);

    // When
    let err = orch.set_up_once().await.unwrap_err();

    // Then: the caller sees the setup error, not the cleanup one
    match err {
        ScenarioError::Provision { source, .. } => {
            assert!(matches!(
                *source,
                ArgusError::Backend(BackendError::Provision(_))
            ));
        }
        other => panic!("expected provisioning error, got {other}"),
    }
    assert_eq!(world.cleanups(), 1);
}

#[tokio::test]
async fn test_panicking_backend_is_rolled_back() {
    // Given: a backend that panics while booting
    let world = FakeWorld::failing(FailAt::SetupPanics);
    let mut orch = orchestrator(&world);

    // When
    let err = orch.set_up_once().await.unwrap_err();

    // Then: the panic surfaces as a provisioning error and cleanup still ran
    match &err {
        ScenarioError::Provision { source, .. } => {
            assert!(matches!(**source, ArgusError::TaskFailed(_)));
        }
        other => panic!("expected provisioning error, got {other}"),
    }
    assert!(err.to_string().contains("hypervisor went away"));
    assert_eq!(world.cleanups(), 1);
    assert_eq!(orch.failed_stage(), Some(SetupStage::Provisioning));
    assert_eq!(orch.state(), LifecycleState::TornDown);
}

#[tokio::test]
async fn test_panicking_recipe_fails_prepare_stage() {
    let world = FakeWorld::failing(FailAt::PreparePanics);
    let mut orch = orchestrator(&world);

    let err = orch.set_up_once().await.unwrap_err();

    assert_eq!(err.stage(), Some("preparing"));
    assert!(err.to_string().contains("installer crashed"));
    assert_eq!(world.cleanups(), 1);
    assert_eq!(world.log.count("introspection:new"), 0);
}

#[tokio::test]
async fn test_panicking_cleanup_is_reported_as_cleanup_error() {
    let world = FakeWorld::failing(FailAt::CleanupPanics);
    let mut orch = orchestrator(&world);
    orch.set_up_once().await.unwrap();

    let err = orch.tear_down_once().await.unwrap_err();

    assert_eq!(err.stage(), Some("tearing-down"));
    assert!(err.to_string().contains("delete call crashed"));
    assert_eq!(orch.state(), LifecycleState::TornDown);
    assert_eq!(world.cleanups(), 1);
}

#[tokio::test]
async fn test_teardown_after_success_runs_once() {
    let world = FakeWorld::healthy();
    let mut orch = orchestrator(&world);
    orch.set_up_once().await.unwrap();

    orch.tear_down_once().await.unwrap();
    orch.tear_down_once().await.unwrap();

    assert_eq!(world.cleanups(), 1);
    assert_eq!(orch.state(), LifecycleState::TornDown);
    assert!(orch.backend().is_none());
    assert!(orch.context("test_late").is_err());
}

#[tokio::test]
async fn test_teardown_failure_is_reported() {
    let world = FakeWorld::failing(FailAt::Cleanup);
    let mut orch = orchestrator(&world);
    orch.set_up_once().await.unwrap();

    let err = orch.tear_down_once().await.unwrap_err();

    assert_eq!(err.stage(), Some("tearing-down"));
    assert!(err.to_string().contains("deleting"));
    assert!(orch.tear_down_once().await.is_ok());
    assert_eq!(world.cleanups(), 1);
}

#[tokio::test]
async fn test_setup_runs_at_most_once() {
    let world = FakeWorld::healthy();
    let mut orch = orchestrator(&world);
    orch.set_up_once().await.unwrap();

    let err = orch.set_up_once().await.unwrap_err();

    assert!(matches!(err, ScenarioError::InvalidState { .. }));
    assert_eq!(world.log.count("backend:setup"), 1);
}

#[tokio::test]
async fn test_output_directory_is_created_and_console_saved() {
    // Given: an output directory that does not exist yet
    let tmp = tempfile::TempDir::new().unwrap();
    let out = tmp.path().join("logs");
    let mut config = ArgusConfig::default();
    config.general.output_directory = out.display().to_string();
    let world = FakeWorld::healthy();
    let mut orch = LifecycleOrchestrator::new(
        Arc::new(fake_descriptor("S", &["G1"])),
        Arc::new(config),
        world.registry(),
    );

    // When
    orch.set_up_once().await.unwrap();

    // Then: the console log was saved after preparation
    let saved = std::fs::read_to_string(out.join("fake-S.log")).unwrap();
    assert!(saved.contains("boot finished"));
}
