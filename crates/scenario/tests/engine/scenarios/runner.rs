//! Runner: failure and panic isolation, reports, parallel suites.

use std::sync::Arc;

use crate::helpers::fakes::*;
use crate::helpers::groups::*;

use argus_core::config::ArgusConfig;
use argus_scenario::{Composer, ScenarioDescriptor, SuiteRun, SuiteRunner, TestStatus};

fn suite_run(world: &FakeWorld, name: &str, groups: &[&str]) -> SuiteRun {
    let catalog = catalog();
    let suite = Composer::new(&catalog)
        .compose(fake_descriptor(name, groups))
        .unwrap();
    SuiteRun::new(suite, Arc::new(ArgusConfig::default()), world.registry())
}

#[tokio::test]
async fn test_failures_and_panics_are_isolated() {
    // Given: a suite with passing, failing and panicking tests
    let world = FakeWorld::healthy();
    let run = suite_run(&world, "Mixed", &["Mixed"]);

    // When
    let report = SuiteRunner::new().run(run).await;

    // Then: every test ran, one failure and one panic recorded
    let statuses: Vec<_> = report.tests.iter().map(|t| (t.name.as_str(), &t.status)).collect();
    assert_eq!(statuses.len(), 4);
    assert_eq!(statuses[0], ("test_a_passes", &TestStatus::Passed));
    assert!(matches!(
        statuses[1].1,
        TestStatus::Failed { message } if message.contains("expected 2 licenses")
    ));
    assert!(matches!(
        statuses[2].1,
        TestStatus::Failed { message } if message.contains("panicked") && message.contains("test_c_panics")
    ));
    assert_eq!(statuses[3], ("test_d_checks_os", &TestStatus::Passed));
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 2);
    assert!(!report.is_success());

    // And: teardown ran exactly once
    assert_eq!(world.cleanups(), 1);
    assert!(report.cleanup_error.is_none());
}

#[tokio::test]
async fn test_setup_failure_marks_tests_not_run() {
    let world = FakeWorld::failing(FailAt::Prepare);
    let run = suite_run(&world, "S", &["G2"]);

    let report = SuiteRunner::new().run(run).await;

    assert!(report.setup_error.as_deref().unwrap().contains("preparation failed"));
    assert_eq!(report.tests.len(), 2);
    assert_eq!(report.not_run(), 2);
    assert_eq!(world.cleanups(), 1);
}

#[tokio::test]
async fn test_cleanup_failure_is_reported_after_tests() {
    let world = FakeWorld::failing(FailAt::Cleanup);
    let run = suite_run(&world, "S", &["G2"]);

    let report = SuiteRunner::new().run(run).await;

    assert_eq!(report.passed(), 2);
    assert!(report.cleanup_error.as_deref().unwrap().contains("cleanup failed"));
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_abstract_suite_is_skipped_without_provisioning() {
    let world = FakeWorld::healthy();
    let catalog = catalog();
    let suite = Composer::new(&catalog)
        .compose(ScenarioDescriptor::builder("Base").backend(FAKE).build())
        .unwrap();
    let run = SuiteRun::new(suite, Arc::new(ArgusConfig::default()), world.registry());

    let report = SuiteRunner::new().run(run).await;

    assert!(report.skipped.as_deref().unwrap().contains("not final"));
    assert!(world.log.entries().is_empty());
}

#[tokio::test]
async fn test_filter_selects_tests_and_skips_unmatched_suites() {
    let world = FakeWorld::healthy();
    let runner = SuiteRunner::new().with_filter("gamma");

    let matched = runner.run(suite_run(&world, "S", &["G2"])).await;
    let unmatched = runner.run(suite_run(&world, "T", &["Mixed"])).await;

    assert_eq!(matched.tests.len(), 1);
    assert_eq!(matched.tests[0].name, "gamma");
    assert!(unmatched.skipped.is_some());
    assert_eq!(world.log.count("backend:setup"), 1);
}

#[tokio::test]
async fn test_setup_panic_does_not_stop_later_suites() {
    // Given: a first suite whose backend panics and a healthy second suite
    let broken = FakeWorld::failing(FailAt::SetupPanics);
    let healthy = FakeWorld::healthy();
    let runs = vec![
        suite_run(&broken, "S1", &["G2"]),
        suite_run(&healthy, "S2", &["G2"]),
    ];

    // When: run one after another
    let reports = SuiteRunner::new().run_many(runs, false).await;

    // Then: the first suite failed setup and was cleaned up, the second ran
    assert_eq!(reports.len(), 2);
    assert!(reports[0].setup_error.as_deref().unwrap().contains("panicked"));
    assert_eq!(reports[0].not_run(), 2);
    assert_eq!(broken.cleanups(), 1);
    assert!(reports[1].is_success());
    assert_eq!(reports[1].passed(), 2);
    assert_eq!(healthy.cleanups(), 1);
}

#[tokio::test]
async fn test_run_many_parallel_keeps_input_order() {
    let world = FakeWorld::healthy();
    let runs = vec![
        suite_run(&world, "Zulu", &["G2"]),
        suite_run(&world, "Alpha", &["G1"]),
        suite_run(&world, "Mike", &["G2"]),
    ];

    let reports = SuiteRunner::new().run_many(runs, true).await;

    let names: Vec<_> = reports.iter().map(|r| r.suite.as_str()).collect();
    assert_eq!(names, vec!["Zulu", "Alpha", "Mike"]);
    assert!(reports.iter().all(|r| r.is_success()));
    assert_eq!(world.cleanups(), 3);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let world = FakeWorld::healthy();
    let report = SuiteRunner::new().run(suite_run(&world, "S", &["G1"])).await;

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["suite"], "S");
    assert_eq!(json["tests"][0]["name"], "alpha");
    assert_eq!(json["tests"][0]["status"], "passed");
    assert_eq!(json["tests"][0]["origin"], "G1::alpha");
}

#[tokio::test]
async fn test_run_test_invokes_bound_method_each_time() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let world = FakeWorld::healthy();
    let counter = Arc::new(AtomicUsize::new(0));
    let mut catalog = argus_scenario::GroupCatalog::new();
    catalog.register(counting(Arc::clone(&counter))).unwrap();
    let suite = Composer::new(&catalog)
        .compose(fake_descriptor("S", &["Counted"]))
        .unwrap();
    let mut run = SuiteRun::new(suite, Arc::new(ArgusConfig::default()), world.registry());

    run.set_up_once().await.unwrap();
    run.run_test("test_one").await;
    run.run_test("test_two").await;
    run.run_test("test_one").await;
    let missing = run.run_test("test_missing").await;
    run.tear_down_once().await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(matches!(missing.status, TestStatus::NotRun { .. }));
}
