//! Packaged template resources.
//!
//! A resource reference is a two-part string `"<module.path>:<filename>"`. Loaders
//! resolve references to text; failing to resolve is always reported as
//! [`Error::TemplateNotFound`] so file nodes and the template environment can tell
//! it apart from other failures.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const RESOURCE_EXAMPLE: &str = "<package>.<module>:<resource filename>";

/// A validated resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    module: String,
    filename: String,
}

impl Resource {
    /// Parses and validates a `"<module.path>:<filename>"` reference.
    pub fn new(reference: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidResource {
            reference: reference.to_string(),
            reason,
        };
        let parts: Vec<&str> = reference.split(':').collect();
        let [module, filename] = parts.as_slice() else {
            return Err(invalid(format!("should look like {RESOURCE_EXAMPLE}")));
        };
        if module.is_empty() || ['-', ' ', '*', '(', ')'].iter().any(|c| module.contains(*c)) {
            return Err(invalid(format!(
                "the part before the colon ({module}) should be a valid module path ({RESOURCE_EXAMPLE})"
            )));
        }
        if filename.is_empty() || Path::new(filename).components().count() != 1 {
            return Err(invalid(format!(
                "the part after the colon ({filename}) should be a single filename ({RESOURCE_EXAMPLE})"
            )));
        }
        Ok(Self { module: module.to_string(), filename: filename.to_string() })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn not_found(&self) -> Error {
        Error::TemplateNotFound { reference: self.to_string() }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.filename)
    }
}

impl std::str::FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Trait for loading packaged template resources.
pub trait ResourceLoader: Send + Sync {
    /// Loads the resource text, or fails with [`Error::TemplateNotFound`].
    fn load(&self, resource: &Resource) -> Result<String>;
}

/// Resources compiled into the binary, keyed by module path and filename.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedResources {
    modules: IndexMap<String, IndexMap<String, String>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `content` under `module:filename`, replacing any previous entry.
    pub fn insert(&mut self, module: &str, filename: &str, content: impl Into<String>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(filename.to_string(), content.into());
    }

    pub fn with(mut self, module: &str, filename: &str, content: impl Into<String>) -> Self {
        self.insert(module, filename, content);
        self
    }
}

impl ResourceLoader for EmbeddedResources {
    fn load(&self, resource: &Resource) -> Result<String> {
        self.modules
            .get(resource.module())
            .and_then(|files| files.get(resource.filename()))
            .cloned()
            .ok_or_else(|| resource.not_found())
    }
}

/// Resources read from a directory tree; `a.b:file` maps to `<root>/a/b/file`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn path_of(&self, resource: &Resource) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(resource.module().split('.'));
        path.join(resource.filename())
    }
}

impl ResourceLoader for DirectoryResources {
    fn load(&self, resource: &Resource) -> Result<String> {
        let path = self.path_of(resource);
        debug!("Loading resource '{}' from {}", resource, path.display());
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(resource.not_found()),
            Err(e) => Err(Error::IoError(e)),
        }
    }
}

/// Tries each loader in order and returns the first hit.
#[derive(Default, Clone)]
pub struct ChoiceLoader {
    loaders: Vec<Arc<dyn ResourceLoader>>,
}

impl ChoiceLoader {
    pub fn new(loaders: Vec<Arc<dyn ResourceLoader>>) -> Self {
        Self { loaders }
    }

    pub fn push(&mut self, loader: Arc<dyn ResourceLoader>) {
        self.loaders.push(loader);
    }
}

impl ResourceLoader for ChoiceLoader {
    fn load(&self, resource: &Resource) -> Result<String> {
        for loader in &self.loaders {
            match loader.load(resource) {
                Err(Error::TemplateNotFound { .. }) => continue,
                other => return other,
            }
        }
        Err(resource.not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parsing() {
        let resource = Resource::new("kiln.recipes.python:readme.md.template").unwrap();
        assert_eq!(resource.module(), "kiln.recipes.python");
        assert_eq!(resource.filename(), "readme.md.template");
        assert_eq!(resource.to_string(), "kiln.recipes.python:readme.md.template");
    }

    #[test]
    fn test_resource_rejects_malformed_references() {
        for reference in ["no-colon", "a:b:c", "bad-module:file", "a.b:dir/file", "a.b:", ":file"] {
            assert!(
                matches!(Resource::new(reference), Err(Error::InvalidResource { .. })),
                "{reference} should be rejected"
            );
        }
    }

    #[test]
    fn test_choice_loader_falls_through() {
        let first = EmbeddedResources::new().with("a", "one.txt", "1");
        let second = EmbeddedResources::new().with("a", "two.txt", "2");
        let loader = ChoiceLoader::new(vec![Arc::new(first), Arc::new(second)]);

        assert_eq!(loader.load(&Resource::new("a:two.txt").unwrap()).unwrap(), "2");
        assert!(matches!(
            loader.load(&Resource::new("a:three.txt").unwrap()),
            Err(Error::TemplateNotFound { .. })
        ));
    }
}
