#![doc = include_str!("../README.md")]

pub mod assertions;
pub mod cloud;
pub mod scenarios;
pub mod userdata;
pub mod windows;

use argus_core::error::ScenarioError;
use argus_scenario::GroupCatalog;

pub use cloud::{CLOUD_SMOKE, TestsBaseSmoke};
pub use scenarios::{configured_scenarios, scenarios};
pub use userdata::{USERDATA, TestUserdata};
pub use windows::{TestSmoke, WINDOWS_SMOKE, parse_licenses};

/// Register every built-in capability group.
pub fn register_groups(catalog: &mut GroupCatalog) -> Result<(), ScenarioError> {
    catalog.register(cloud::group())?;
    catalog.register(windows::group())?;
    catalog.register(userdata::group())?;
    Ok(())
}

/// A catalog holding only the built-in groups.
pub fn catalog() -> Result<GroupCatalog, ScenarioError> {
    let mut catalog = GroupCatalog::new();
    register_groups(&mut catalog)?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_holds_builtin_groups() {
        let catalog = catalog().unwrap();
        assert_eq!(catalog.names(), vec!["TestSmoke", "TestUserdata", "TestsBaseSmoke"]);
    }

    #[test]
    fn registering_twice_is_rejected() {
        let mut catalog = catalog().unwrap();
        let err = register_groups(&mut catalog).unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateTestGroup(_)));
    }

    #[test]
    fn every_scenario_group_is_in_the_catalog() {
        let catalog = catalog().unwrap();
        for descriptor in scenarios() {
            assert!(catalog.resolve(&descriptor).is_ok(), "{}", descriptor.name);
        }
    }
}
