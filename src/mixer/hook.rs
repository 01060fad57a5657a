//! Extensibility points run around recipe creation.

use crate::context::Context;
use log::debug;
use std::path::{Path, PathBuf};

/// A unit that may rewrite the recipe path and context.
///
/// Pre-hooks run before anything is written; post-hooks run once every file
/// exists. Returning `None` keeps the current path and context.
pub trait Hook: Send + Sync {
    fn call(&self, recipe_path: &Path, context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>>;

    /// Name used in logs.
    fn name(&self) -> &str {
        crate::context::short_type_name::<Self>()
    }
}

/// Runs `hooks` in order, threading the path and context through each.
///
/// Errors propagate unmodified and abort the remaining hooks.
pub fn run_hooks(
    hooks: &[Box<dyn Hook>],
    recipe_path: PathBuf,
    context: Context,
) -> anyhow::Result<(PathBuf, Context)> {
    hooks.iter().try_fold((recipe_path, context), |(path, context), hook| {
        debug!("Running hook '{}' on {}", hook.name(), path.display());
        Ok(hook.call(&path, &context)?.unwrap_or((path, context)))
    })
}
