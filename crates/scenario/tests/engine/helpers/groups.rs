//! Small capability groups used across engine tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use argus_core::error::ArgusError;
use argus_scenario::{CapabilityGroup, GroupCatalog, TestContext, TestGroup, TestResult};

/// Group with a handle on the shared test context.
pub struct Probe {
    ctx: TestContext,
}

impl CapabilityGroup for Probe {
    fn from_context(ctx: TestContext) -> Self {
        Self { ctx }
    }
}

impl Probe {
    async fn passes(self) -> TestResult {
        Ok(())
    }

    async fn fails(self) -> TestResult {
        Err(ArgusError::assertion("expected 2 licenses, found 1"))
    }

    async fn panics(self) -> TestResult {
        panic!("index out of bounds in {}", self.ctx.test_name);
    }

    async fn checks_os(self) -> TestResult {
        let version = self.ctx.introspection.os_version().await?;
        if version.starts_with("FakeOS") {
            Ok(())
        } else {
            Err(ArgusError::assertion(format!("unexpected os {version}")))
        }
    }
}

/// `G1 { alpha, beta (requires "https") }`.
pub fn g1() -> TestGroup {
    TestGroup::builder::<Probe>("G1")
        .test("alpha", Probe::passes)
        .test_requiring("beta", "https", Probe::passes)
        .build()
}

/// `G2 { alpha, gamma }`.
pub fn g2() -> TestGroup {
    TestGroup::builder::<Probe>("G2")
        .test("alpha", Probe::passes)
        .test("gamma", Probe::passes)
        .build()
}

/// A group mixing passing, failing and panicking tests.
pub fn mixed() -> TestGroup {
    TestGroup::builder::<Probe>("Mixed")
        .test("test_a_passes", Probe::passes)
        .test("test_b_fails", Probe::fails)
        .test("test_c_panics", Probe::panics)
        .test("test_d_checks_os", Probe::checks_os)
        .build()
}

/// A group with no test methods.
pub fn empty() -> TestGroup {
    TestGroup::builder::<Probe>("Empty").build()
}

/// A group counting how many fresh instances were built.
#[allow(dead_code)]
pub fn counting(counter: Arc<AtomicUsize>) -> TestGroup {
    struct Counted;

    impl CapabilityGroup for Counted {
        fn from_context(_ctx: TestContext) -> Self {
            Counted
        }
    }

    let first = Arc::clone(&counter);
    let second = counter;
    TestGroup::builder::<Counted>("Counted")
        .test("test_one", move |_g: Counted| {
            let counter = Arc::clone(&first);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .test("test_two", move |_g: Counted| {
            let counter = Arc::clone(&second);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build()
}

/// Catalog with every helper group registered.
pub fn catalog() -> GroupCatalog {
    let mut catalog = GroupCatalog::new();
    for group in [g1(), g2(), mixed(), empty()] {
        catalog.register(group).unwrap();
    }
    catalog
}
