//! Engine test scenarios, one module per area.

mod composition;
mod lifecycle;
mod runner;
