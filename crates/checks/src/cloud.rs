//! `TestsBaseSmoke`: checks every cloud guest should pass, whatever its OS.

use argus_collaborators::WINDOWS_INTROSPECTION;
use argus_scenario::{CapabilityGroup, TestContext, TestGroup, TestResult};
use tracing::info;

use crate::assertions::{ensure, ensure_contains};

/// Group name.
pub const CLOUD_SMOKE: &str = "TestsBaseSmoke";

/// Cross-platform init service smoke checks.
pub struct TestsBaseSmoke {
    ctx: TestContext,
}

impl CapabilityGroup for TestsBaseSmoke {
    fn from_context(ctx: TestContext) -> Self {
        Self { ctx }
    }
}

impl TestsBaseSmoke {
    fn is_windows(&self) -> bool {
        self.ctx.introspection.name() == WINDOWS_INTROSPECTION
    }

    fn init_log(&self) -> &str {
        let conf = &self.ctx.config.introspection;
        if self.is_windows() {
            &conf.windows_init_log
        } else {
            &conf.linux_init_log
        }
    }

    async fn test_os_version_reported(self) -> TestResult {
        let version = self.ctx.introspection.os_version().await?;
        info!(test = %self.ctx.test_name, version = %version, "guest os version");
        ensure(!version.is_empty(), "guest reported an empty os version")
    }

    async fn test_config_handlers_executed(self) -> TestResult {
        let traces = self.ctx.introspection.config_handler_traces().await?;
        ensure(
            !traces.is_empty(),
            "init service log shows no executed config handlers",
        )
    }

    async fn test_init_log_present(self) -> TestResult {
        let (dir, file) = split_remote_path(self.init_log());
        let entries = self.ctx.introspection.list_location(dir).await?;
        ensure_contains(&entries, file, dir)
    }
}

/// Split a Windows or POSIX path into directory and file name.
pub fn split_remote_path(path: &str) -> (&str, &str) {
    match path.rfind(['\\', '/']) {
        Some(0) => (&path[..1], &path[1..]),
        Some(at) => (&path[..at], &path[at + 1..]),
        None => (".", path),
    }
}

/// The group definition.
pub fn group() -> TestGroup {
    TestGroup::builder::<TestsBaseSmoke>(CLOUD_SMOKE)
        .test("test_os_version_reported", TestsBaseSmoke::test_os_version_reported)
        .test(
            "test_config_handlers_executed",
            TestsBaseSmoke::test_config_handlers_executed,
        )
        .test("test_init_log_present", TestsBaseSmoke::test_init_log_present)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_windows_and_posix_paths() {
        assert_eq!(
            split_remote_path(r"C:\Program Files\Cloudbase-Init\log\cloudbase-init.log"),
            (r"C:\Program Files\Cloudbase-Init\log", "cloudbase-init.log")
        );
        assert_eq!(
            split_remote_path("/var/log/cloud-init.log"),
            ("/var/log", "cloud-init.log")
        );
        assert_eq!(split_remote_path("/vmlinuz"), ("/", "vmlinuz"));
        assert_eq!(split_remote_path("notes.txt"), (".", "notes.txt"));
    }

    #[test]
    fn group_has_three_unconditional_tests() {
        let g = group();
        assert_eq!(g.len(), 3);
        assert!(g.methods().all(|m| m.required_service_tag().is_none()));
    }
}
