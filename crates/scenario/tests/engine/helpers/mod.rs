//! Shared engine test helpers.
//!
//! Provides fake collaborators with failure injection, a call log shared
//! between them, and small capability groups to compose.

pub mod fakes;
pub mod groups;
