//! Scenario descriptors: the declarative configuration of one scenario.
//!
//! A descriptor is *final* when the backend, introspection and recipe
//! variants, the service tag and at least one test group are all set. Only
//! final descriptors are composed into runnable suites; the others serve as
//! abstract bases that concrete scenarios [`derive`](ScenarioDescriptor::derive)
//! from.
//!
//! # Example
//! ```
//! use argus_scenario::ScenarioDescriptor;
//!
//! let base = ScenarioDescriptor::builder("WindowsBase")
//!     .backend("static")
//!     .introspection("windows")
//!     .recipe("noop")
//!     .build();
//! assert!(!base.is_final());
//!
//! let smoke = base.derive("WindowsSmoke").with_test_group("TestSmoke");
//! assert!(smoke.is_final());
//! ```

use std::collections::BTreeMap;

use argus_core::config::ScenarioOverride;
use serde::Serialize;

/// Default service tag.
pub const DEFAULT_SERVICE_TAG: &str = "http";

/// Declarative configuration of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioDescriptor {
    /// Scenario (and suite) name
    pub name: String,
    /// Backend variant identifier
    pub backend: Option<String>,
    /// Introspection variant identifier
    pub introspection: Option<String>,
    /// Recipe variant identifier
    pub recipe: Option<String>,
    /// Compatibility label used to filter test methods
    pub service_tag: String,
    /// Capability test group names, in composition order
    pub test_groups: Vec<String>,
    /// Opaque user data for the instance's init service
    #[serde(skip)]
    pub userdata: Option<Vec<u8>>,
    /// Metadata for the instance's init service
    pub metadata: BTreeMap<String, String>,
    /// Availability zone
    pub availability_zone: Option<String>,
}

impl ScenarioDescriptor {
    /// Start building a descriptor.
    pub fn builder(name: impl Into<String>) -> ScenarioDescriptorBuilder {
        ScenarioDescriptorBuilder::new(name)
    }

    /// Copy this descriptor under a new name, for specialization.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Append a test group.
    pub fn with_test_group(mut self, group: impl Into<String>) -> Self {
        self.test_groups.push(group.into());
        self
    }

    /// Replace the service tag.
    pub fn with_service_tag(mut self, tag: impl Into<String>) -> Self {
        self.service_tag = tag.into();
        self
    }

    /// Replace the user data.
    pub fn with_userdata(mut self, userdata: impl Into<Vec<u8>>) -> Self {
        self.userdata = Some(userdata.into());
        self
    }

    /// Fields that keep this descriptor from being final, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.backend.as_deref()) {
            missing.push("backend");
        }
        if is_blank(self.introspection.as_deref()) {
            missing.push("introspection");
        }
        if is_blank(self.recipe.as_deref()) {
            missing.push("recipe");
        }
        if self.service_tag.trim().is_empty() {
            missing.push("service_tag");
        }
        if self.test_groups.is_empty() {
            missing.push("test_groups");
        }
        missing
    }

    /// Whether this descriptor can be composed into a runnable suite.
    pub fn is_final(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Apply a per-scenario override from the configuration.
    ///
    /// Metadata is merged key by key; the other fields are replaced when set.
    pub fn apply_override(&mut self, over: &ScenarioOverride) {
        if let Some(tag) = &over.service_tag {
            self.service_tag = tag.clone();
        }
        if let Some(zone) = &over.availability_zone {
            self.availability_zone = Some(zone.clone());
        }
        if let Some(userdata) = &over.userdata {
            self.userdata = Some(userdata.clone().into_bytes());
        }
        for (key, value) in &over.metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Builder for [`ScenarioDescriptor`].
#[derive(Debug, Clone)]
pub struct ScenarioDescriptorBuilder {
    descriptor: ScenarioDescriptor,
}

impl ScenarioDescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ScenarioDescriptor {
                name: name.into(),
                backend: None,
                introspection: None,
                recipe: None,
                service_tag: DEFAULT_SERVICE_TAG.to_owned(),
                test_groups: Vec::new(),
                userdata: None,
                metadata: BTreeMap::new(),
                availability_zone: None,
            },
        }
    }

    /// Backend variant identifier.
    pub fn backend(mut self, variant: impl Into<String>) -> Self {
        self.descriptor.backend = Some(variant.into());
        self
    }

    /// Introspection variant identifier.
    pub fn introspection(mut self, variant: impl Into<String>) -> Self {
        self.descriptor.introspection = Some(variant.into());
        self
    }

    /// Recipe variant identifier.
    pub fn recipe(mut self, variant: impl Into<String>) -> Self {
        self.descriptor.recipe = Some(variant.into());
        self
    }

    /// Service tag (default `"http"`).
    pub fn service_tag(mut self, tag: impl Into<String>) -> Self {
        self.descriptor.service_tag = tag.into();
        self
    }

    /// Append one test group.
    pub fn test_group(mut self, group: impl Into<String>) -> Self {
        self.descriptor.test_groups.push(group.into());
        self
    }

    /// Append several test groups, keeping their order.
    pub fn test_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor
            .test_groups
            .extend(groups.into_iter().map(Into::into));
        self
    }

    /// User data payload.
    pub fn userdata(mut self, userdata: impl Into<Vec<u8>>) -> Self {
        self.descriptor.userdata = Some(userdata.into());
        self
    }

    /// One metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.metadata.insert(key.into(), value.into());
        self
    }

    /// Availability zone.
    pub fn availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.descriptor.availability_zone = Some(zone.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> ScenarioDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn final_descriptor() -> ScenarioDescriptor {
        ScenarioDescriptor::builder("S")
            .backend("b")
            .introspection("i")
            .recipe("r")
            .test_group("G1")
            .build()
    }

    #[test]
    fn service_tag_defaults_to_http() {
        let d = ScenarioDescriptor::builder("S").build();
        assert_eq!(d.service_tag, "http");
    }

    #[test]
    fn complete_descriptor_is_final() {
        let d = final_descriptor();
        assert!(d.is_final());
        assert!(d.missing_fields().is_empty());
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let d = ScenarioDescriptor::builder("S").recipe("r").build();
        assert_eq!(
            d.missing_fields(),
            vec!["backend", "introspection", "test_groups"]
        );
        assert!(!d.is_final());
    }

    #[test]
    fn blank_variant_is_not_final() {
        let d = ScenarioDescriptor::builder("S")
            .backend(" ")
            .introspection("i")
            .recipe("r")
            .test_group("G")
            .build();
        assert_eq!(d.missing_fields(), vec!["backend"]);
    }

    #[test]
    fn empty_service_tag_is_not_final() {
        let d = final_descriptor().with_service_tag("");
        assert_eq!(d.missing_fields(), vec!["service_tag"]);
    }

    #[test]
    fn derive_keeps_base_and_appends_groups() {
        let base = final_descriptor();
        let derived = base.derive("Derived").with_test_group("G2");
        assert_eq!(derived.name, "Derived");
        assert_eq!(derived.test_groups, vec!["G1", "G2"]);
        assert_eq!(base.test_groups, vec!["G1"]);
        assert_eq!(derived.backend, base.backend);
    }

    #[test]
    fn override_replaces_and_merges() {
        let mut d = ScenarioDescriptor::builder("S")
            .metadata("keep", "1")
            .metadata("replace", "old")
            .build();
        let over = ScenarioOverride {
            service_tag: Some("https".to_owned()),
            availability_zone: Some("az-2".to_owned()),
            metadata: BTreeMap::from([("replace".to_owned(), "new".to_owned())]),
            userdata: Some("#ps1\necho hi".to_owned()),
            skip: false,
        };

        d.apply_override(&over);

        assert_eq!(d.service_tag, "https");
        assert_eq!(d.availability_zone.as_deref(), Some("az-2"));
        assert_eq!(d.metadata["keep"], "1");
        assert_eq!(d.metadata["replace"], "new");
        assert_eq!(d.userdata.as_deref(), Some(&b"#ps1\necho hi"[..]));
    }

    #[test]
    fn empty_override_changes_nothing() {
        let mut d = final_descriptor();
        let before = d.clone();
        d.apply_override(&ScenarioOverride::default());
        assert_eq!(d, before);
    }
}
