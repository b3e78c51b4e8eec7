#![doc = include_str!("../README.md")]

pub mod backend;
pub mod config;
pub mod error;
pub mod introspection;
pub mod metrics;
pub mod recipe;
pub mod remote;
pub mod types;

// --- Re-exports ---

// Errors
pub use error::{
    ArgusError, BackendError, ConfigError, RecipeError, RemoteError, ScenarioError,
};

// Configuration
pub use config::{ArgusConfig, ScenarioOverride};

// Collaborator seams
pub use backend::{Backend, BackendParams, DynBackend};
pub use introspection::{DynIntrospection, Introspection, IntrospectionParams};
pub use recipe::{DynRecipe, Recipe, RecipeParams};
pub use remote::RemoteClient;

// Domain types
pub use types::{BoxFuture, CommandOutput, CommandType, Credentials, Protocol};
