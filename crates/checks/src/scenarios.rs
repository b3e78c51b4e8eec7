//! Built-in scenario catalog.
//!
//! `WindowsBase` and `LinuxBase` pick collaborators but no test groups, so
//! they stay abstract. The final scenarios are derived from them.

use argus_collaborators::{
    COMMAND_RECIPE, LINUX_INTROSPECTION, NOOP_RECIPE, STATIC_BACKEND, WINDOWS_INTROSPECTION,
};
use argus_core::config::ArgusConfig;
use argus_scenario::ScenarioDescriptor;
use tracing::debug;

use crate::cloud::CLOUD_SMOKE;
use crate::userdata::{USERDATA, USERDATA_SCRIPT};
use crate::windows::WINDOWS_SMOKE;

/// Abstract base for Windows guests.
pub fn windows_base() -> ScenarioDescriptor {
    ScenarioDescriptor::builder("WindowsBase")
        .backend(STATIC_BACKEND)
        .introspection(WINDOWS_INTROSPECTION)
        .recipe(COMMAND_RECIPE)
        .build()
}

/// Abstract base for Linux guests.
pub fn linux_base() -> ScenarioDescriptor {
    ScenarioDescriptor::builder("LinuxBase")
        .backend(STATIC_BACKEND)
        .introspection(LINUX_INTROSPECTION)
        .recipe(NOOP_RECIPE)
        .build()
}

/// Windows smoke over the default (`http`) service tag.
pub fn windows_smoke_http() -> ScenarioDescriptor {
    windows_base()
        .derive("WindowsSmokeHttp")
        .with_test_group(CLOUD_SMOKE)
        .with_test_group(WINDOWS_SMOKE)
}

/// Windows smoke with the instance prepared for `https`.
pub fn windows_smoke_https() -> ScenarioDescriptor {
    windows_smoke_http()
        .derive("WindowsSmokeHttps")
        .with_service_tag("https")
}

/// Windows smoke plus user data execution.
pub fn windows_userdata() -> ScenarioDescriptor {
    windows_smoke_http()
        .derive("WindowsUserdata")
        .with_test_group(USERDATA)
        .with_userdata(USERDATA_SCRIPT)
}

/// Cloud smoke on a Linux guest.
pub fn linux_smoke() -> ScenarioDescriptor {
    linux_base().derive("LinuxSmoke").with_test_group(CLOUD_SMOKE)
}

/// Every built-in descriptor, abstract bases first.
pub fn scenarios() -> Vec<ScenarioDescriptor> {
    vec![
        windows_base(),
        linux_base(),
        windows_smoke_http(),
        windows_smoke_https(),
        windows_userdata(),
        linux_smoke(),
    ]
}

/// Built-in descriptors with `[scenarios.<name>]` overrides applied.
///
/// Scenarios marked `skip = true` are left out.
pub fn configured_scenarios(config: &ArgusConfig) -> Vec<ScenarioDescriptor> {
    scenarios()
        .into_iter()
        .filter_map(|mut descriptor| match config.scenario_override(&descriptor.name) {
            Some(over) if over.skip => {
                debug!(scenario = %descriptor.name, "scenario skipped by configuration");
                None
            }
            Some(over) => {
                descriptor.apply_override(over);
                Some(descriptor)
            }
            None => Some(descriptor),
        })
        .collect()
}
