//! Built-in recipes and the templates they are made of.

pub mod python;

use crate::constants::RECIPE_GROUP;
use crate::mixer::{factory, RecipeFactory};
use crate::registry::Registry;
use crate::resources::EmbeddedResources;

pub use python::{ApiRecipe, GitConfig, PackageRecipe, PythonFields, RecipeRecipe, RepoMetadata};

/// Every compiled-in template resource.
pub fn builtin_resources() -> EmbeddedResources {
    let mut resources = EmbeddedResources::new();
    python::register_resources(&mut resources);
    resources
}

/// Registry with the built-in recipes under [`RECIPE_GROUP`].
pub fn registry() -> Registry<dyn RecipeFactory> {
    Registry::new()
        .with(RECIPE_GROUP, "python_package", factory::<PackageRecipe>())
        .with(RECIPE_GROUP, "python_api", factory::<ApiRecipe>())
        .with(RECIPE_GROUP, "recipe", factory::<RecipeRecipe>())
}
