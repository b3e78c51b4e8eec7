//! Composition: binding groups into suites.

use crate::helpers::fakes::fake_descriptor;
use crate::helpers::groups::*;

use argus_core::error::ScenarioError;
use argus_scenario::{Composer, Origin, ScenarioDescriptor, compose_into};

/// G1{alpha, beta@https} + G2{alpha, gamma} on an http scenario.
#[test]
fn test_collision_and_tag_filtering() {
    // Given: a final http scenario listing G1 then G2
    let catalog = catalog();
    let descriptor = fake_descriptor("S", &["G1", "G2"]);

    // When: composing
    let suite = Composer::new(&catalog).compose(descriptor).unwrap();

    // Then: beta is filtered, G2's alpha is qualified
    assert_eq!(suite.test_names(), vec!["alpha", "gamma", "test_G2_alpha"]);
    assert_eq!(
        suite.get("test_G2_alpha").unwrap().origin(),
        &Origin::Group {
            group: "G2".to_owned(),
            method: "alpha".to_owned(),
        }
    );
    assert_eq!(
        suite.get("alpha").unwrap().origin(),
        &Origin::Group {
            group: "G1".to_owned(),
            method: "alpha".to_owned(),
        }
    );
}

#[test]
fn test_matching_tag_keeps_method() {
    // Given: the same groups on an https scenario
    let catalog = catalog();
    let descriptor = fake_descriptor("S", &["G1", "G2"]).with_service_tag("https");

    // When
    let suite = Composer::new(&catalog).compose(descriptor).unwrap();

    // Then: beta is bound under its own name
    assert_eq!(
        suite.test_names(),
        vec!["alpha", "beta", "gamma", "test_G2_alpha"]
    );
}

#[test]
fn test_group_order_decides_collision_winner() {
    // Given: G2 listed before G1
    let catalog = catalog();
    let descriptor = fake_descriptor("S", &["G2", "G1"]);

    // When
    let suite = Composer::new(&catalog).compose(descriptor).unwrap();

    // Then: G2 keeps `alpha`, G1's copy is qualified
    assert_eq!(suite.test_names(), vec!["alpha", "gamma", "test_G1_alpha"]);
}

#[test]
fn test_recomposition_is_idempotent() {
    // Given: a composed suite
    let catalog = catalog();
    let composer = Composer::new(&catalog);
    let mut suite = composer.compose(fake_descriptor("S", &["G1", "G2"])).unwrap();
    let before: Vec<String> = suite.test_names().iter().map(|s| s.to_string()).collect();

    // When: composing the same groups again
    let bound = composer.compose_suite(&mut suite).unwrap();

    // Then: nothing new is bound
    assert_eq!(bound, 0);
    assert_eq!(suite.test_names(), before);
}

#[test]
fn test_non_final_descriptor_yields_empty_suite() {
    // Given: an abstract base with no test groups
    let catalog = catalog();
    let base = ScenarioDescriptor::builder("WindowsBase")
        .backend("fake")
        .introspection("fake")
        .recipe("fake")
        .build();

    // When
    let suite = Composer::new(&catalog).compose(base).unwrap();

    // Then: empty, abstract, with a diagnostic naming what is missing
    assert!(suite.is_empty());
    assert!(suite.is_abstract());
    assert!(suite.diagnostics()[0].contains("test_groups"));
}

#[test]
fn test_non_final_descriptor_is_not_resolved() {
    // Given: an abstract descriptor naming an unknown group
    let catalog = catalog();
    let base = ScenarioDescriptor::builder("Base").test_group("Nope").build();

    // When
    let suite = Composer::new(&catalog).compose(base).unwrap();

    // Then: no resolution error, just an empty suite
    assert!(suite.is_empty());
}

#[test]
fn test_unknown_group_fails_composition() {
    let catalog = catalog();
    let err = Composer::new(&catalog)
        .compose(fake_descriptor("S", &["G1", "Nope"]))
        .unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::UnknownTestGroup { ref group, .. } if group == "Nope"
    ));
}

#[test]
fn test_empty_group_binds_nothing() {
    let catalog = catalog();
    let suite = Composer::new(&catalog)
        .compose(fake_descriptor("S", &["Empty"]))
        .unwrap();
    assert!(suite.is_empty());
    assert!(!suite.is_abstract());
    assert!(suite.diagnostics().is_empty());
}

#[test]
fn test_qualified_name_collision_is_a_defect() {
    // Given: a suite already defining both `alpha` and `test_G2_alpha`
    let mut suite = argus_scenario::RunnableSuite::new(fake_descriptor("S", &["G2"]));
    suite.define_test("alpha", |_ctx| async { Ok(()) }).unwrap();
    suite
        .define_test("test_G2_alpha", |_ctx| async { Ok(()) })
        .unwrap();

    // When
    let err = compose_into(&mut suite, &[g2()]).unwrap_err();

    // Then: the defect names the binding and the group
    assert!(matches!(
        err,
        ScenarioError::CompositionDefect { ref name, ref group, ref suite }
            if name == "test_G2_alpha" && group == "G2" && suite == "S"
    ));
    assert_eq!(suite.test_names(), vec!["alpha", "test_G2_alpha"]);
}

#[test]
fn test_compose_all_keeps_order() {
    let catalog = catalog();
    let suites = Composer::new(&catalog)
        .compose_all([
            fake_descriptor("Second", &["G2"]),
            fake_descriptor("First", &["G1"]),
        ])
        .unwrap();
    let names: Vec<_> = suites.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Second", "First"]);
}
