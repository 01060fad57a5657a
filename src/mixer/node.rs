//! The shared contract of files and folders: names, paths and result shapes.

use crate::context::Context;
use crate::error::Result;
use crate::mixer::{File, Folder};
use crate::renderer::{is_template, TemplateRenderer, TemplateStr};
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callable producing a name from the render context.
pub type NameFn = Arc<dyn Fn(&Context) -> Option<String> + Send + Sync>;

/// The name of a filesystem node.
#[derive(Clone)]
pub enum Name {
    /// Used verbatim.
    Literal(String),
    /// Rendered against the context.
    Template(TemplateStr),
    /// Computed from the context; `None` means the node has no path of its own.
    Computed(NameFn),
}

impl Name {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Option<String> + Send + Sync + 'static,
    {
        Name::Computed(Arc::new(f))
    }

    /// Resolves the name against `context`.
    pub fn resolve(&self, renderer: &dyn TemplateRenderer, context: &Context) -> Result<Option<String>> {
        match self {
            Name::Literal(name) => Ok(Some(name.clone())),
            Name::Template(template) => template.render(renderer, context).map(Some),
            Name::Computed(f) => Ok(f(context)),
        }
    }

    /// The name if it does not depend on the context.
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Name::Literal(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Name {
    /// Strings with template syntax become templates, everything else a literal.
    fn from(value: &str) -> Self {
        match TemplateStr::new(value) {
            Ok(template) => Name::Template(template),
            Err(_) => Name::Literal(value.to_string()),
        }
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        if is_template(&value) {
            Name::from(value.as_str())
        } else {
            Name::Literal(value)
        }
    }
}

impl From<TemplateStr> for Name {
    fn from(value: TemplateStr) -> Self {
        Name::Template(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Literal(name) => write!(f, "{name:?}"),
            Name::Template(template) => write!(f, "<TemplateStr> {:?}", template.as_str()),
            Name::Computed(_) => f.write_str("<callable>"),
        }
    }
}

/// Rendered file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Written and compared in text mode.
    Text(String),
    /// Written and compared in binary mode, never rendered.
    Bytes(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Bytes(_) => None,
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Bytes(value)
    }
}

/// One entry of a materialize/preview result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    File(Content),
    Folder(Tree),
}

/// Absolute path to rendered entry, mirroring the node tree.
pub type Tree = IndexMap<PathBuf, Rendered>;

/// Looks up the content rendered for `path` anywhere in `tree`.
pub fn find_content<'a>(tree: &'a Tree, path: &Path) -> Option<&'a Content> {
    tree.iter().find_map(|(entry, rendered)| match rendered {
        Rendered::File(content) if entry == path => Some(content),
        Rendered::File(_) => None,
        Rendered::Folder(children) => find_content(children, path),
    })
}

/// Every file path in `tree`, depth first.
pub fn file_paths(tree: &Tree) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for (path, rendered) in tree {
        match rendered {
            Rendered::File(_) => paths.push(path.clone()),
            Rendered::Folder(children) => paths.extend(file_paths(children)),
        }
    }
    paths
}

/// Outcome of comparing on-disk state to freshly rendered expectations.
///
/// Every expected path lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub missing: Vec<PathBuf>,
    pub errors: Vec<PathBuf>,
    pub ok: Vec<PathBuf>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }

    pub fn extend(&mut self, other: Report) {
        self.missing.extend(other.missing);
        self.errors.extend(other.errors);
        self.ok.extend(other.ok);
    }

    pub fn len(&self) -> usize {
        self.missing.len() + self.errors.len() + self.ok.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, path-addressable element of a template tree.
pub trait FilesystemObject {
    /// Stable identifier among siblings, not a path component.
    fn id(&self) -> Option<&str>;

    fn name(&self) -> &Name;

    /// Resolves the node path under `base_path`.
    ///
    /// `override_path` replaces the name entirely. `None` means the node has no path
    /// and is skipped by every operation.
    fn path(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Option<PathBuf>> {
        if let Some(override_path) = override_path {
            return Ok(Some(base_path.join(override_path)));
        }
        Ok(self.name().resolve(renderer, context)?.map(|name| base_path.join(name)))
    }

    /// Writes the node to disk and returns what was written.
    fn materialize(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree>;

    /// Renders exactly what [`FilesystemObject::materialize`] would write, without I/O.
    fn preview(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree>;

    /// Compares on-disk state with freshly rendered content.
    fn verify(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Report>;
}

/// A child of a folder.
#[derive(Debug, Clone)]
pub enum Node {
    File(File),
    Folder(Folder),
}

impl Node {
    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(file) => Some(file),
            Node::Folder(_) => None,
        }
    }

    fn inner(&self) -> &dyn FilesystemObject {
        match self {
            Node::File(file) => file,
            Node::Folder(folder) => folder,
        }
    }
}

impl From<File> for Node {
    fn from(value: File) -> Self {
        Node::File(value)
    }
}

impl From<Folder> for Node {
    fn from(value: Folder) -> Self {
        Node::Folder(value)
    }
}

impl FilesystemObject for Node {
    fn id(&self) -> Option<&str> {
        self.inner().id()
    }

    fn name(&self) -> &Name {
        self.inner().name()
    }

    fn materialize(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        self.inner().materialize(renderer, base_path, context, override_path)
    }

    fn preview(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        self.inner().preview(renderer, base_path, context, override_path)
    }

    fn verify(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Report> {
        self.inner().verify(renderer, base_path, context, override_path)
    }
}
