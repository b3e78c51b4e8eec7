//! Assertion helpers returning [`TestResult`] instead of panicking.

use argus_core::error::ArgusError;
use argus_scenario::TestResult;

/// Fail unless `actual` equals `expected`.
pub fn ensure_eq<T>(expected: T, actual: T, what: &str) -> TestResult
where
    T: PartialEq + std::fmt::Debug,
{
    if expected == actual {
        Ok(())
    } else {
        Err(ArgusError::assertion(format!(
            "{what}: expected {expected:?}, got {actual:?}"
        )))
    }
}

/// Fail unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(ArgusError::assertion(message))
    }
}

/// Fail unless `haystack` has an entry equal to `needle`.
pub fn ensure_contains(haystack: &[String], needle: &str, what: &str) -> TestResult {
    ensure(
        haystack.iter().any(|entry| entry == needle),
        format!("{what}: '{needle}' not found in {haystack:?}"),
    )
}
