//! Collaborator variant registry.
//!
//! Descriptors name their backend, recipe and introspection by identifier;
//! the registry maps each identifier to a factory. Identifiers are resolved
//! when a suite is set up, so an unknown one surfaces as that stage's error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use argus_core::backend::{BackendParams, DynBackend};
use argus_core::error::{ArgusError, ScenarioError};
use argus_core::introspection::{DynIntrospection, IntrospectionParams};
use argus_core::recipe::{DynRecipe, RecipeParams};

/// Builds a backend from its parameters.
pub type BackendFactory =
    Arc<dyn Fn(BackendParams) -> Result<Arc<dyn DynBackend>, ArgusError> + Send + Sync>;

/// Builds a recipe from its parameters.
pub type RecipeFactory =
    Arc<dyn Fn(RecipeParams) -> Result<Box<dyn DynRecipe>, ArgusError> + Send + Sync>;

/// Builds an introspection from its parameters.
pub type IntrospectionFactory =
    Arc<dyn Fn(IntrospectionParams) -> Result<Arc<dyn DynIntrospection>, ArgusError> + Send + Sync>;

const BACKEND: &str = "backend";
const RECIPE: &str = "recipe";
const INTROSPECTION: &str = "introspection";

/// Factories for every known collaborator variant.
#[derive(Clone, Default)]
pub struct VariantRegistry {
    backends: BTreeMap<String, BackendFactory>,
    recipes: BTreeMap<String, RecipeFactory>,
    introspections: BTreeMap<String, IntrospectionFactory>,
}

impl VariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend variant.
    pub fn register_backend<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), ScenarioError>
    where
        F: Fn(BackendParams) -> Result<Arc<dyn DynBackend>, ArgusError> + Send + Sync + 'static,
    {
        insert(&mut self.backends, BACKEND, name.into(), Arc::new(factory))
    }

    /// Register a recipe variant.
    pub fn register_recipe<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), ScenarioError>
    where
        F: Fn(RecipeParams) -> Result<Box<dyn DynRecipe>, ArgusError> + Send + Sync + 'static,
    {
        insert(&mut self.recipes, RECIPE, name.into(), Arc::new(factory))
    }

    /// Register an introspection variant.
    pub fn register_introspection<F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<(), ScenarioError>
    where
        F: Fn(IntrospectionParams) -> Result<Arc<dyn DynIntrospection>, ArgusError>
            + Send
            + Sync
            + 'static,
    {
        insert(&mut self.introspections, INTROSPECTION, name.into(), Arc::new(factory))
    }

    /// Build a backend by variant name.
    pub fn build_backend(
        &self,
        name: &str,
        params: BackendParams,
    ) -> Result<Arc<dyn DynBackend>, ArgusError> {
        let factory = lookup(&self.backends, BACKEND, name)?;
        factory(params)
    }

    /// Build a recipe by variant name.
    pub fn build_recipe(
        &self,
        name: &str,
        params: RecipeParams,
    ) -> Result<Box<dyn DynRecipe>, ArgusError> {
        let factory = lookup(&self.recipes, RECIPE, name)?;
        factory(params)
    }

    /// Build an introspection by variant name.
    pub fn build_introspection(
        &self,
        name: &str,
        params: IntrospectionParams,
    ) -> Result<Arc<dyn DynIntrospection>, ArgusError> {
        let factory = lookup(&self.introspections, INTROSPECTION, name)?;
        factory(params)
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Registered recipe names, sorted.
    pub fn recipe_names(&self) -> Vec<&str> {
        self.recipes.keys().map(String::as_str).collect()
    }

    /// Registered introspection names, sorted.
    pub fn introspection_names(&self) -> Vec<&str> {
        self.introspections.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for VariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantRegistry")
            .field("backends", &self.backend_names())
            .field("recipes", &self.recipe_names())
            .field("introspections", &self.introspection_names())
            .finish()
    }
}

fn insert<T>(
    map: &mut BTreeMap<String, T>,
    kind: &'static str,
    name: String,
    factory: T,
) -> Result<(), ScenarioError> {
    if map.contains_key(&name) {
        return Err(ScenarioError::DuplicateVariant { kind, name });
    }
    tracing::debug!(kind, variant = %name, "collaborator variant registered");
    map.insert(name, factory);
    Ok(())
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a T, ScenarioError> {
    map.get(name).ok_or_else(|| ScenarioError::UnknownVariant {
        kind,
        name: name.to_owned(),
    })
}
