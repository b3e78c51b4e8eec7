//! Suite execution: setup once, every selected test, teardown once.
//!
//! Each test runs on its own tokio task, so a panicking test is reported as
//! a failure and the remaining tests still run. Suites run one after another
//! unless parallel execution is requested.

use std::sync::Arc;
use std::time::Instant;

use argus_core::config::ArgusConfig;
use argus_core::error::ScenarioError;
use argus_core::metrics as m;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::lifecycle::{LifecycleOrchestrator, panic_message};
use crate::suite::RunnableSuite;
use crate::variants::VariantRegistry;

/// Result of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed { message: String },
    NotRun { reason: String },
}

impl TestStatus {
    fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::NotRun { .. } => "not_run",
        }
    }
}

/// One test's outcome within a suite report.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// Bound test name
    pub name: String,
    /// Provenance, e.g. `TestSmoke::test_licensing`
    pub origin: String,
    /// Result
    #[serde(flatten)]
    pub status: TestStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

/// Everything that happened while running one suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// Service tag the suite was composed for
    pub service_tag: String,
    /// Why the suite was skipped without provisioning, if it was
    pub skipped: Option<String>,
    /// Setup stage error, if setup failed
    pub setup_error: Option<String>,
    /// Cleanup error, if teardown failed
    pub cleanup_error: Option<String>,
    /// Per-test outcomes, sorted by test name
    pub tests: Vec<TestOutcome>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    fn new(suite: &RunnableSuite) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.name().to_owned(),
            service_tag: suite.descriptor().service_tag.clone(),
            skipped: None,
            setup_error: None,
            cleanup_error: None,
            tests: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Number of passed tests.
    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Passed))
    }

    /// Number of failed tests.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Failed { .. }))
    }

    /// Number of tests that never ran.
    pub fn not_run(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::NotRun { .. }))
    }

    /// Whether setup, every test and teardown succeeded.
    pub fn is_success(&self) -> bool {
        self.setup_error.is_none()
            && self.cleanup_error.is_none()
            && self.failed() == 0
            && self.not_run() == 0
    }

    fn count(&self, pred: impl Fn(&TestStatus) -> bool) -> usize {
        self.tests.iter().filter(|t| pred(&t.status)).count()
    }
}

/// A composed suite paired with the orchestrator that sets it up.
#[derive(Debug)]
pub struct SuiteRun {
    suite: RunnableSuite,
    lifecycle: LifecycleOrchestrator,
}

impl SuiteRun {
    /// Pair `suite` with a fresh orchestrator.
    pub fn new(suite: RunnableSuite, config: Arc<ArgusConfig>, variants: Arc<VariantRegistry>) -> Self {
        let lifecycle = LifecycleOrchestrator::new(Arc::clone(suite.descriptor()), config, variants);
        Self { suite, lifecycle }
    }

    /// Suite name.
    pub fn name(&self) -> &str {
        self.suite.name()
    }

    /// Bound test names, sorted.
    pub fn test_names(&self) -> Vec<&str> {
        self.suite.test_names()
    }

    /// The composed suite.
    pub fn suite(&self) -> &RunnableSuite {
        &self.suite
    }

    /// The lifecycle orchestrator.
    pub fn lifecycle(&self) -> &LifecycleOrchestrator {
        &self.lifecycle
    }

    /// Set up the scenario once.
    pub async fn set_up_once(&mut self) -> Result<(), ScenarioError> {
        self.lifecycle.set_up_once().await
    }

    /// Tear the scenario down once.
    pub async fn tear_down_once(&mut self) -> Result<(), ScenarioError> {
        self.lifecycle.tear_down_once().await
    }

    /// Run one bound test against the live scenario.
    pub async fn run_test(&self, name: &str) -> TestOutcome {
        let started = Instant::now();
        let Some(method) = self.suite.get(name) else {
            return outcome(
                name,
                String::new(),
                TestStatus::NotRun {
                    reason: format!("no test named '{name}'"),
                },
                started,
            );
        };
        let origin = method.origin().to_string();

        let ctx = match self.lifecycle.context(name) {
            Ok(ctx) => ctx,
            Err(e) => {
                return outcome(name, origin, TestStatus::NotRun { reason: e.to_string() }, started);
            }
        };

        let status = match tokio::spawn(method.invoke(ctx)).await {
            Ok(Ok(())) => TestStatus::Passed,
            Ok(Err(e)) => TestStatus::Failed {
                message: e.to_string(),
            },
            Err(join_err) if join_err.is_panic() => TestStatus::Failed {
                message: format!("test panicked: {}", panic_message(join_err.into_panic())),
            },
            Err(join_err) => TestStatus::Failed {
                message: join_err.to_string(),
            },
        };
        metrics::counter!(m::RUNNER_TESTS_TOTAL, m::LABEL_RESULT => status.label()).increment(1);
        info!(
            suite = self.name(),
            test = name,
            result = status.label(),
            "test finished"
        );
        outcome(name, origin, status, started)
    }
}

fn outcome(name: &str, origin: String, status: TestStatus, started: Instant) -> TestOutcome {
    TestOutcome {
        name: name.to_owned(),
        origin,
        status,
        duration_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs suites end to end and reports on them.
#[derive(Debug, Clone, Default)]
pub struct SuiteRunner {
    filter: Option<String>,
}

impl SuiteRunner {
    /// Runner selecting every test.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only run tests whose name contains `pattern`.
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|p| name.contains(p))
    }

    /// Set up, run the selected tests, tear down.
    pub async fn run(&self, mut run: SuiteRun) -> SuiteReport {
        let started = Instant::now();
        let mut report = SuiteReport::new(&run.suite);

        if run.suite.is_abstract() {
            let reason = run
                .suite
                .diagnostics()
                .first()
                .cloned()
                .unwrap_or_else(|| "scenario is not final".to_owned());
            info!(suite = run.name(), reason = %reason, "skipping abstract scenario");
            report.skipped = Some(reason);
            return finish(report, started);
        }

        let selected: Vec<String> = run
            .suite
            .test_names()
            .into_iter()
            .filter(|name| self.selects(name))
            .map(str::to_owned)
            .collect();
        if selected.is_empty() {
            info!(suite = run.name(), "no tests selected, not provisioning");
            report.skipped = Some("no tests selected".to_owned());
            return finish(report, started);
        }

        if let Err(e) = run.set_up_once().await {
            let reason = e.to_string();
            report.tests = selected
                .iter()
                .map(|name| {
                    let origin = run
                        .suite
                        .get(name)
                        .map(|b| b.origin().to_string())
                        .unwrap_or_default();
                    outcome(
                        name,
                        origin,
                        TestStatus::NotRun {
                            reason: "scenario setup failed".to_owned(),
                        },
                        started,
                    )
                })
                .collect();
            report.setup_error = Some(reason);
            return finish(report, started);
        }

        for name in &selected {
            report.tests.push(run.run_test(name).await);
        }

        if let Err(e) = run.tear_down_once().await {
            report.cleanup_error = Some(e.to_string());
        }
        finish(report, started)
    }

    /// Run several suites, in order or concurrently.
    ///
    /// Reports come back in input order either way.
    pub async fn run_many(&self, runs: Vec<SuiteRun>, parallel: bool) -> Vec<SuiteReport> {
        if !parallel {
            let mut reports = Vec::with_capacity(runs.len());
            for run in runs {
                reports.push(self.run(run).await);
            }
            return reports;
        }

        let names: Vec<String> = runs.iter().map(|r| r.name().to_owned()).collect();
        let mut set = JoinSet::new();
        for (index, run) in runs.into_iter().enumerate() {
            let runner = self.clone();
            set.spawn(async move { (index, runner.run(run).await) });
        }

        let mut slots: Vec<Option<SuiteReport>> = vec![None; names.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => warn!(error = %e, "suite task failed"),
            }
        }

        slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| SuiteReport {
                    run_id: Uuid::new_v4(),
                    suite: name,
                    service_tag: String::new(),
                    skipped: None,
                    setup_error: Some("suite task aborted".to_owned()),
                    cleanup_error: None,
                    tests: Vec::new(),
                    duration_ms: 0,
                })
            })
            .collect()
    }
}

fn finish(mut report: SuiteReport, started: Instant) -> SuiteReport {
    report.duration_ms = elapsed_ms(started);
    let result = if report.skipped.is_some() {
        "skipped"
    } else if report.is_success() {
        "passed"
    } else {
        "failed"
    };
    metrics::counter!(m::RUNNER_SUITES_TOTAL, m::LABEL_RESULT => result).increment(1);
    info!(
        suite = %report.suite,
        result,
        passed = report.passed(),
        failed = report.failed(),
        not_run = report.not_run(),
        "suite finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_selects_by_substring() {
        let runner = SuiteRunner::new().with_filter("licen");
        assert!(runner.selects("test_licensing"));
        assert!(!runner.selects("test_os_version"));
        assert!(SuiteRunner::new().selects("anything"));
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(TestStatus::Failed {
            message: "x".to_owned(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn empty_report_is_success() {
        let suite = RunnableSuite::new(crate::ScenarioDescriptor::builder("S").build());
        let report = SuiteReport::new(&suite);
        assert!(report.is_success());
        assert_eq!(report.passed(), 0);
    }
}
