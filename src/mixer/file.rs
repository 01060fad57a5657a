//! File nodes: leaves of a template tree.

use crate::context::Context;
use crate::error::Result;
use crate::mixer::node::{Content, FilesystemObject, Name, Rendered, Report, Tree};
use crate::renderer::TemplateRenderer;
use crate::resources::Resource;
use log::debug;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callable producing file content from the render context.
pub type ContentFn = Arc<dyn Fn(&Context) -> Option<Content> + Send + Sync>;

/// Where the content of a file comes from.
#[derive(Clone)]
pub enum Source {
    Text(String),
    Bytes(Vec<u8>),
    /// Loaded through the renderer's resource loaders.
    Resource(Resource),
    /// Read from disk when rendering.
    Path(PathBuf),
    /// `None` from the callable means the file is skipped.
    Computed(ContentFn),
}

impl Source {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Option<Content> + Send + Sync + 'static,
    {
        Source::Computed(Arc::new(f))
    }

    /// Resolves the raw (unrendered) content.
    fn resolve(&self, renderer: &dyn TemplateRenderer, context: &Context) -> Result<Option<Content>> {
        let content = match self {
            Source::Resource(resource) => Content::Text(renderer.load_resource(resource)?),
            Source::Path(path) => {
                let bytes = fs::read(path)?;
                match String::from_utf8(bytes) {
                    Ok(text) => Content::Text(text),
                    Err(e) => Content::Bytes(e.into_bytes()),
                }
            }
            Source::Computed(f) => match f(context) {
                Some(content) => content,
                None => return Ok(None),
            },
            Source::Text(text) => Content::Text(text.clone()),
            Source::Bytes(bytes) => Content::Bytes(bytes.clone()),
        };
        Ok(Some(content))
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Source::Bytes(bytes) => write!(f, "Bytes(<{} bytes>)", bytes.len()),
            Source::Resource(resource) => f.debug_tuple("Resource").field(&resource.to_string()).finish(),
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Computed(_) => f.write_str("Computed(<callable>)"),
        }
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Text(value.to_string())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Text(value)
    }
}

impl From<Vec<u8>> for Source {
    fn from(value: Vec<u8>) -> Self {
        Source::Bytes(value)
    }
}

impl From<Resource> for Source {
    fn from(value: Resource) -> Self {
        Source::Resource(value)
    }
}

impl From<PathBuf> for Source {
    fn from(value: PathBuf) -> Self {
        Source::Path(value)
    }
}

/// A file in a template tree.
#[derive(Debug, Clone)]
pub struct File {
    id: Option<String>,
    name: Name,
    content: Source,
}

impl File {
    pub fn new(name: impl Into<Name>, content: impl Into<Source>) -> Self {
        Self { id: None, name: name.into(), content: content.into() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn content(&self) -> &Source {
        &self.content
    }

    /// Resolves the content and renders it if it is text.
    ///
    /// Bytes are returned untouched; `None` means the file contributes nothing.
    pub fn render(&self, renderer: &dyn TemplateRenderer, context: &Context) -> Result<Option<Content>> {
        match self.content.resolve(renderer, context)? {
            Some(Content::Text(text)) => Ok(Some(Content::Text(renderer.render(&text, context)?))),
            other => Ok(other),
        }
    }

    fn rendered(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Option<(PathBuf, Content)>> {
        let Some(path) = self.path(renderer, base_path, context, override_path)? else {
            return Ok(None);
        };
        Ok(self.render(renderer, context)?.map(|content| (path, content)))
    }
}

impl FilesystemObject for File {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> &Name {
        &self.name
    }

    fn materialize(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        let mut tree = Tree::new();
        if let Some((path, content)) = self.rendered(renderer, base_path, context, override_path)? {
            debug!("Writing file: {}", path.display());
            fs::write(&path, content.as_bytes())?;
            tree.insert(path, Rendered::File(content));
        }
        Ok(tree)
    }

    fn preview(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        let mut tree = Tree::new();
        if let Some((path, content)) = self.rendered(renderer, base_path, context, override_path)? {
            tree.insert(path, Rendered::File(content));
        }
        Ok(tree)
    }

    fn verify(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Report> {
        let mut report = Report::default();
        let Some((path, expected)) = self.rendered(renderer, base_path, context, override_path)? else {
            return Ok(report);
        };
        if !path.exists() {
            report.missing.push(path);
            return Ok(report);
        }
        let matches = match expected {
            Content::Text(expected) => fs::read_to_string(&path).is_ok_and(|actual| actual == expected),
            Content::Bytes(expected) => fs::read(&path).is_ok_and(|actual| actual == expected),
        };
        if matches {
            report.ok.push(path);
        } else {
            report.errors.push(path);
        }
        Ok(report)
    }
}
