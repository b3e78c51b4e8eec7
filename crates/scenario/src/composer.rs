//! Suite composition: binding capability test groups into runnable suites.
//!
//! For each group, in descriptor order, and each of its methods, in
//! lexicographic order:
//!
//! 1. a method requiring a different service tag is skipped;
//! 2. a method whose provenance is already bound is skipped, which keeps
//!    re-composition idempotent;
//! 3. a name the suite already has is rewritten to `test_<group>_<method>`;
//! 4. if that name is taken too, composition fails with
//!    [`ScenarioError::CompositionDefect`] and the suite is left untouched.
//!
//! Collisions resolve first-come: whichever group claims a name first keeps
//! it. Non-final descriptors produce no bindings, only a diagnostic.

use std::collections::BTreeMap;

use argus_core::error::ScenarioError;
use argus_core::metrics as m;
use tracing::{debug, info, warn};

use crate::descriptor::ScenarioDescriptor;
use crate::group::{GroupCatalog, TestGroup};
use crate::suite::{BoundTestMethod, Origin, RESERVED_NAMES, RunnableSuite};

/// Composes descriptors into suites using groups from a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    catalog: &'a GroupCatalog,
}

impl<'a> Composer<'a> {
    /// Composer over `catalog`.
    pub fn new(catalog: &'a GroupCatalog) -> Self {
        Self { catalog }
    }

    /// Build a fresh suite for `descriptor`.
    pub fn compose(&self, descriptor: ScenarioDescriptor) -> Result<RunnableSuite, ScenarioError> {
        let mut suite = RunnableSuite::new(descriptor);
        self.compose_suite(&mut suite)?;
        Ok(suite)
    }

    /// Bind the descriptor's groups into an existing suite.
    ///
    /// Returns the number of newly bound methods.
    pub fn compose_suite(&self, suite: &mut RunnableSuite) -> Result<usize, ScenarioError> {
        if !check_final(suite) {
            return Ok(0);
        }
        let groups = self.catalog.resolve(suite.descriptor())?;
        compose_into(suite, &groups)
    }

    /// Compose every descriptor, keeping their order.
    pub fn compose_all<I>(&self, descriptors: I) -> Result<Vec<RunnableSuite>, ScenarioError>
    where
        I: IntoIterator<Item = ScenarioDescriptor>,
    {
        descriptors.into_iter().map(|d| self.compose(d)).collect()
    }
}

/// Bind `groups` into `suite`, all or nothing.
///
/// Returns the number of newly bound methods.
pub fn compose_into<G: AsRef<TestGroup>>(
    suite: &mut RunnableSuite,
    groups: &[G],
) -> Result<usize, ScenarioError> {
    if !check_final(suite) {
        return Ok(0);
    }

    let suite_name = suite.name().to_owned();
    let service_tag = suite.descriptor().service_tag.clone();
    let mut staged: BTreeMap<String, BoundTestMethod> = suite.bound().clone();
    let mut bound = 0_usize;
    let mut filtered = 0_usize;

    for group in groups.iter().map(AsRef::as_ref) {
        for method in group.methods() {
            if !method.applies_to(&service_tag) {
                debug!(
                    suite = %suite_name,
                    group = group.name(),
                    method = method.name(),
                    required = method.required_service_tag().unwrap_or_default(),
                    service_tag = %service_tag,
                    "service tag mismatch, skipping test"
                );
                filtered += 1;
                continue;
            }

            let origin = Origin::Group {
                group: group.name().to_owned(),
                method: method.name().to_owned(),
            };
            if staged.values().any(|b| b.origin() == &origin) {
                continue;
            }

            let taken = |name: &str| RESERVED_NAMES.contains(&name) || staged.contains_key(name);
            let name = if taken(method.name()) {
                let renamed = format!("test_{}_{}", group.name(), method.name());
                if taken(&renamed) {
                    return Err(ScenarioError::CompositionDefect {
                        suite: suite_name,
                        name: renamed,
                        group: group.name().to_owned(),
                    });
                }
                debug!(
                    suite = %suite_name,
                    original = method.name(),
                    renamed = %renamed,
                    "test name collision, binding under qualified name"
                );
                renamed
            } else {
                method.name().to_owned()
            };

            staged.insert(
                name.clone(),
                BoundTestMethod::new(name, origin, method.body().clone()),
            );
            bound += 1;
        }
    }

    suite.replace_bound(staged);

    metrics::counter!(m::COMPOSER_SUITES_COMPOSED_TOTAL).increment(1);
    metrics::counter!(m::COMPOSER_TESTS_BOUND_TOTAL).increment(bound as u64);
    metrics::counter!(m::COMPOSER_TESTS_FILTERED_TOTAL).increment(filtered as u64);

    info!(
        suite = %suite_name,
        bound,
        filtered,
        total = suite.len(),
        "suite composed"
    );
    Ok(bound)
}

fn check_final(suite: &mut RunnableSuite) -> bool {
    let missing = suite.descriptor().missing_fields();
    if missing.is_empty() {
        return true;
    }
    let missing = missing.join(", ");
    warn!(
        suite = suite.name(),
        missing = %missing,
        "scenario is not final, no tests bound"
    );
    metrics::counter!(m::COMPOSER_ABSTRACT_SKIPPED_TOTAL).increment(1);
    suite.push_diagnostic(format!("scenario is not final (missing: {missing})"));
    false
}
