//! `TestUserdata`: verifies the user data script handed to the instance ran.

use argus_scenario::{CapabilityGroup, TestContext, TestGroup, TestResult};

use crate::assertions::{ensure, ensure_contains};

/// Group name.
pub const USERDATA: &str = "TestUserdata";

/// File created by [`USERDATA_SCRIPT`].
pub const USERDATA_MARKER: &str = "argus-userdata.txt";

/// User data shipped with the `WindowsUserdata` scenario.
pub const USERDATA_SCRIPT: &str =
    "#ps1_sysnative\nNew-Item -ItemType File -Path C:\\argus-userdata.txt -Value 42\n";

const MARKER_LOCATION: &str = "C:\\";

/// User data checks.
pub struct TestUserdata {
    ctx: TestContext,
}

impl CapabilityGroup for TestUserdata {
    fn from_context(ctx: TestContext) -> Self {
        Self { ctx }
    }
}

impl TestUserdata {
    async fn test_userdata_executed(self) -> TestResult {
        let traces = self.ctx.introspection.config_handler_traces().await?;
        ensure(
            traces.iter().any(|t| t.contains("UserData")),
            format!("user data handler did not run (handlers: {traces:?})"),
        )?;

        let names = self.ctx.introspection.list_location(MARKER_LOCATION).await?;
        ensure_contains(&names, USERDATA_MARKER, MARKER_LOCATION)
    }
}

/// The group definition.
pub fn group() -> TestGroup {
    TestGroup::builder::<TestUserdata>(USERDATA)
        .test("test_userdata_executed", TestUserdata::test_userdata_executed)
        .build()
}
