//! Extension registry: name to factory lookup, grouped by a logical key.
//!
//! Entries are registered explicitly by the embedding application rather than
//! discovered at runtime.

use indexmap::IndexMap;
use log::{debug, warn};
use std::sync::Arc;

/// The lookup contract recipes depend on.
pub trait ExtensionRegistry<T: ?Sized> {
    /// Names registered under `group`, in registration order.
    fn list_names(&self, group: &str) -> Vec<String>;

    fn load(&self, group: &str, name: &str) -> Option<Arc<T>>;
}

/// In-memory registry.
pub struct Registry<T: ?Sized> {
    groups: IndexMap<String, IndexMap<String, Arc<T>>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self { groups: IndexMap::new() }
    }

    /// Registers `extension` as `name` in `group`, replacing an existing entry.
    pub fn register(&mut self, group: &str, name: &str, extension: Arc<T>) {
        debug!("Registering extension '{}' for '{}'", name, group);
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), extension);
    }

    pub fn with(mut self, group: &str, name: &str, extension: Arc<T>) -> Self {
        self.register(group, name, extension);
        self
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ExtensionRegistry<T> for Registry<T> {
    fn list_names(&self, group: &str) -> Vec<String> {
        self.groups
            .get(group)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn load(&self, group: &str, name: &str) -> Option<Arc<T>> {
        let extension = self.groups.get(group).and_then(|entries| entries.get(name)).cloned();
        if extension.is_none() {
            warn!("Extension '{}' not found for '{}'", name, group);
        }
        extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_are_independent() {
        let registry = Registry::<str>::new()
            .with("recipes", "package", Arc::from("p"))
            .with("recipes", "api", Arc::from("a"))
            .with("providers", "github", Arc::from("g"));

        assert_eq!(registry.list_names("recipes"), vec!["package", "api"]);
        assert_eq!(registry.load("providers", "github").as_deref(), Some("g"));
        assert!(registry.load("recipes", "github").is_none());
        assert!(registry.list_names("installers").is_empty());
    }
}
