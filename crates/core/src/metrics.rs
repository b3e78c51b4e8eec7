//! Metric names and descriptions.
//!
//! All metric names are defined here; the scenario engine records them with
//! `metrics::counter!()` / `metrics::histogram!()`. Without an installed
//! recorder every call is a no-op.
//!
//! # Naming
//!
//! - prefix: `argus_`
//! - area: `composer_`, `lifecycle_`, `runner_`
//! - suffix: `_total` (counter), `_seconds` (histogram)
//!
//! # Example
//!
//! ```ignore
//! metrics::counter!(argus_core::metrics::COMPOSER_TESTS_BOUND_TOTAL).increment(1);
//! ```

// ─── Label keys ──────────────────────────────────────────────────────

/// Lifecycle stage label key (provisioning, preparing, introspecting)
pub const LABEL_STAGE: &str = "stage";

/// Result label key (passed, failed, not_run)
pub const LABEL_RESULT: &str = "result";

/// Scenario label key
pub const LABEL_SCENARIO: &str = "scenario";

// ─── Composer ────────────────────────────────────────────────────────

/// Composer: suites composed (counter)
pub const COMPOSER_SUITES_COMPOSED_TOTAL: &str = "argus_composer_suites_composed_total";

/// Composer: test methods bound into suites (counter)
pub const COMPOSER_TESTS_BOUND_TOTAL: &str = "argus_composer_tests_bound_total";

/// Composer: test methods dropped by service tag filtering (counter)
pub const COMPOSER_TESTS_FILTERED_TOTAL: &str = "argus_composer_tests_filtered_total";

/// Composer: non-final descriptors skipped (counter)
pub const COMPOSER_ABSTRACT_SKIPPED_TOTAL: &str = "argus_composer_abstract_skipped_total";

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Lifecycle: setup stage failures (counter, label: stage)
pub const LIFECYCLE_SETUP_FAILURES_TOTAL: &str = "argus_lifecycle_setup_failures_total";

/// Lifecycle: cleanup failures (counter)
pub const LIFECYCLE_CLEANUP_FAILURES_TOTAL: &str = "argus_lifecycle_cleanup_failures_total";

/// Lifecycle: time from provisioning start to ready (histogram, seconds)
pub const LIFECYCLE_SETUP_DURATION_SECONDS: &str = "argus_lifecycle_setup_duration_seconds";

// ─── Runner ──────────────────────────────────────────────────────────

/// Runner: test outcomes (counter, label: result)
pub const RUNNER_TESTS_TOTAL: &str = "argus_runner_tests_total";

/// Runner: suites run (counter, label: result)
pub const RUNNER_SUITES_TOTAL: &str = "argus_runner_suites_total";

/// Setup duration histogram buckets (seconds).
///
/// Instance boots range from seconds (static hosts) to tens of minutes.
pub const SETUP_DURATION_BUCKETS: [f64; 8] = [1.0, 5.0, 30.0, 60.0, 300.0, 600.0, 1200.0, 3600.0];

/// Register descriptions for every metric.
///
/// Call once after installing a global recorder.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        COMPOSER_SUITES_COMPOSED_TOTAL,
        "Number of scenario suites composed"
    );
    describe_counter!(
        COMPOSER_TESTS_BOUND_TOTAL,
        "Number of test methods bound into suites"
    );
    describe_counter!(
        COMPOSER_TESTS_FILTERED_TOTAL,
        "Number of test methods skipped because of a service tag mismatch"
    );
    describe_counter!(
        COMPOSER_ABSTRACT_SKIPPED_TOTAL,
        "Number of non-final descriptors left uncomposed"
    );
    describe_counter!(
        LIFECYCLE_SETUP_FAILURES_TOTAL,
        "Setup failures per lifecycle stage"
    );
    describe_counter!(
        LIFECYCLE_CLEANUP_FAILURES_TOTAL,
        "Backend cleanup failures"
    );
    describe_histogram!(
        LIFECYCLE_SETUP_DURATION_SECONDS,
        "Time from provisioning start to ready in seconds"
    );
    describe_counter!(RUNNER_TESTS_TOTAL, "Test outcomes by result");
    describe_counter!(RUNNER_SUITES_TOTAL, "Suite runs by result");
}
