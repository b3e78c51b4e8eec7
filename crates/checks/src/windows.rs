//! `TestSmoke`: Windows specific smoke checks for the init service.

use std::collections::BTreeMap;

use argus_core::types::CommandType;
use argus_scenario::{CapabilityGroup, TestContext, TestGroup, TestResult};
use tracing::debug;

use crate::assertions::{ensure, ensure_eq};

/// Group name.
pub const WINDOWS_SMOKE: &str = "TestSmoke";

/// Display name the init service registers with the service manager.
pub const SERVICE_DISPLAY_NAME: &str = "Cloud Initialization Service";

const DISPLAY_NAME_QUERY: &str =
    "(Get-Service | where -Property Name -match cloudbase-init).DisplayName";
const LICENSING_QUERY: &str =
    "Get-WmiObject SoftwareLicensingProduct | where PartialProductKey | Select Name, LicenseStatus";
const LISTENER_QUERY: &str = "winrm enumerate winrm/config/listener";

/// Windows smoke checks.
pub struct TestSmoke {
    ctx: TestContext,
}

impl CapabilityGroup for TestSmoke {
    fn from_context(ctx: TestContext) -> Self {
        Self { ctx }
    }
}

impl TestSmoke {
    async fn powershell(&self, command: &str) -> Result<String, argus_core::ArgusError> {
        self.ctx
            .introspection
            .remote_client()
            .run_command_verbose(command, CommandType::Powershell)
            .await
    }

    async fn test_service_display_name(self) -> TestResult {
        let stdout = self.powershell(DISPLAY_NAME_QUERY).await?;
        ensure_eq(SERVICE_DISPLAY_NAME, stdout.trim(), "service display name")
    }

    async fn test_licensing(self) -> TestResult {
        let stdout = self.powershell(LICENSING_QUERY).await?;
        let licenses = parse_licenses(&stdout);
        debug!(products = licenses.len(), "licensing output parsed");
        ensure(
            licenses.len() <= 1,
            "Too many expected products in licensing output.",
        )?;
        let Some((product, status)) = licenses.iter().next() else {
            return ensure(false, "no licensed product in licensing output");
        };
        ensure(
            status != "0",
            format!("product '{product}' is unlicensed (status {status})"),
        )
    }

    async fn test_http_winrm_configured(self) -> TestResult {
        self.listener_configured("HTTP").await
    }

    async fn test_https_winrm_configured(self) -> TestResult {
        self.listener_configured("HTTPS").await
    }

    async fn listener_configured(&self, transport: &str) -> TestResult {
        let stdout = self
            .ctx
            .introspection
            .remote_client()
            .run_command_verbose(LISTENER_QUERY, CommandType::Cmd)
            .await?;
        let transports = listener_transports(&stdout);
        ensure(
            transports.iter().any(|t| t == transport),
            format!("no WinRM listener for {transport} (found {transports:?})"),
        )
    }
}

/// Parse `Select Name, LicenseStatus` table output into product → status.
///
/// The first two lines are the header and its separator.
pub fn parse_licenses(output: &str) -> BTreeMap<String, String> {
    output
        .trim()
        .lines()
        .skip(2)
        .map(|line| {
            let line = line.trim_end();
            match line.rsplit_once(' ') {
                Some((product, status)) => (product.trim().to_owned(), status.to_owned()),
                None => (String::new(), line.to_owned()),
            }
        })
        .collect()
}

/// Transports of every listener in `winrm enumerate` output.
pub fn listener_transports(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "Transport").then(|| value.trim().to_owned())
        })
        .collect()
}

/// The group definition.
pub fn group() -> TestGroup {
    TestGroup::builder::<TestSmoke>(WINDOWS_SMOKE)
        .test("test_service_display_name", TestSmoke::test_service_display_name)
        .test("test_licensing", TestSmoke::test_licensing)
        .test_requiring(
            "test_http_winrm_configured",
            "http",
            TestSmoke::test_http_winrm_configured,
        )
        .test_requiring(
            "test_https_winrm_configured",
            "https",
            TestSmoke::test_https_winrm_configured,
        )
        .build()
}
