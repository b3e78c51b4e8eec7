#![doc = include_str!("../README.md")]

pub mod introspection;
pub mod recipe;
pub mod ssh;
pub mod static_backend;

use std::sync::Arc;

use argus_core::backend::DynBackend;
use argus_core::error::ScenarioError;
use argus_core::introspection::DynIntrospection;
use argus_core::recipe::DynRecipe;
use argus_scenario::VariantRegistry;

pub use introspection::{LINUX_INTROSPECTION, Platform, RemoteIntrospection, WINDOWS_INTROSPECTION};
pub use recipe::{COMMAND_RECIPE, CommandRecipe, NOOP_RECIPE, NoopRecipe};
pub use ssh::SshRemoteClient;
pub use static_backend::{STATIC_BACKEND, StaticBackend};

/// Register every built-in collaborator variant.
pub fn register_builtin(registry: &mut VariantRegistry) -> Result<(), ScenarioError> {
    registry.register_backend(STATIC_BACKEND, |params| {
        Ok(Arc::new(StaticBackend::new(params)) as Arc<dyn DynBackend>)
    })?;

    registry.register_recipe(NOOP_RECIPE, |params| {
        Ok(Box::new(NoopRecipe::new(params)) as Box<dyn DynRecipe>)
    })?;
    registry.register_recipe(COMMAND_RECIPE, |params| {
        Ok(Box::new(CommandRecipe::new(params)?) as Box<dyn DynRecipe>)
    })?;

    registry.register_introspection(WINDOWS_INTROSPECTION, |params| {
        Ok(Arc::new(RemoteIntrospection::new(Platform::Windows, params)) as Arc<dyn DynIntrospection>)
    })?;
    registry.register_introspection(LINUX_INTROSPECTION, |params| {
        Ok(Arc::new(RemoteIntrospection::new(Platform::Linux, params)) as Arc<dyn DynIntrospection>)
    })?;

    tracing::debug!("built-in collaborator variants registered");
    Ok(())
}

/// A registry holding only the built-in variants.
pub fn builtin_registry() -> Result<VariantRegistry, ScenarioError> {
    let mut registry = VariantRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
}
