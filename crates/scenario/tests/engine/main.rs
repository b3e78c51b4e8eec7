//! Integration tests for the scenario engine.
//!
//! These tests drive composition, lifecycle and suite execution end to end
//! against fake collaborators with failure injection.
//!
//! # Test Structure
//!
//! - `helpers/` -- fake backend, recipe and introspection, call tracking, groups
//! - `scenarios/` -- test files organized by engine area
//!
//! # Running
//!
//! ```bash
//! cargo test -p argus-scenario --test engine
//! ```

mod helpers;
mod scenarios;
