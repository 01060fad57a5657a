//! Folder nodes: composites holding an ordered list of children.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::mixer::node::{FilesystemObject, Name, Node, Rendered, Report, Tree};
use crate::renderer::TemplateRenderer;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A folder in a template tree.
///
/// No two children may share an id; this is checked whenever contents change.
#[derive(Debug, Clone)]
pub struct Folder {
    id: Option<String>,
    name: Name,
    contents: Vec<Node>,
}

impl Folder {
    /// Creates a folder, failing on the first duplicated child id.
    pub fn new(name: impl Into<Name>, contents: Vec<Node>) -> Result<Self> {
        check_unique_ids(&contents)?;
        Ok(Self { id: None, name: name.into(), contents })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn contents(&self) -> &[Node] {
        &self.contents
    }

    /// Position of the first child with id `key`, else of the first child whose
    /// static name is `key`. Templated and computed names are never matched.
    pub fn index(&self, key: &str) -> Result<usize> {
        self.contents
            .iter()
            .position(|node| node.id() == Some(key))
            .or_else(|| self.contents.iter().position(|node| node.name().as_static() == Some(key)))
            .ok_or_else(|| Error::NodeNotFound { key: key.to_string() })
    }

    pub fn get(&self, key: &str) -> Result<&Node> {
        let index = self.index(key)?;
        Ok(&self.contents[index])
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Node> {
        let index = self.index(key)?;
        Ok(&mut self.contents[index])
    }

    /// Looks up a child folder, failing if `key` addresses a file.
    pub fn folder_mut(&mut self, key: &str) -> Result<&mut Folder> {
        self.get_mut(key)?
            .as_folder_mut()
            .ok_or_else(|| Error::NodeNotFound { key: format!("{key} (folder)") })
    }

    /// Replaces the child addressed by `key` in place, or appends `node`.
    pub fn set(&mut self, key: &str, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        match self.index(key) {
            Ok(index) => {
                self.ensure_id_free(&node, Some(index))?;
                self.contents[index] = node;
            }
            Err(_) => {
                self.ensure_id_free(&node, None)?;
                self.contents.push(node);
            }
        }
        Ok(())
    }

    /// Appends a child.
    pub fn push(&mut self, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        self.ensure_id_free(&node, None)?;
        self.contents.push(node);
        Ok(())
    }

    pub fn extend<I, N>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        for node in nodes {
            self.push(node)?;
        }
        Ok(())
    }

    fn ensure_id_free(&self, node: &Node, replacing: Option<usize>) -> Result<()> {
        let Some(id) = node.id() else {
            return Ok(());
        };
        let taken = self
            .contents
            .iter()
            .enumerate()
            .any(|(i, child)| Some(i) != replacing && child.id() == Some(id));
        if taken {
            return Err(Error::DuplicateId { id: id.to_string() });
        }
        Ok(())
    }

    /// Indented outline of the tree, files listed before folders.
    ///
    /// Names are rendered when a context is given, otherwise shown as declared.
    pub fn outline(&self, renderer: &dyn TemplateRenderer, context: Option<&Context>) -> Result<String> {
        let mut out = String::new();
        self.write_outline(renderer, context, 0, &mut out)?;
        Ok(out)
    }

    fn write_outline(
        &self,
        renderer: &dyn TemplateRenderer,
        context: Option<&Context>,
        indent: usize,
        out: &mut String,
    ) -> Result<()> {
        out.push_str(&describe(self, "Folder", renderer, context)?);
        let mut children: Vec<&Node> = self.contents.iter().collect();
        children.sort_by_key(|node| matches!(node, Node::Folder(_)));
        for child in children {
            out.push('\n');
            out.push_str(&" ".repeat(indent));
            out.push_str("|- ");
            match child {
                Node::File(file) => out.push_str(&describe(file, "File", renderer, context)?),
                Node::Folder(folder) => folder.write_outline(renderer, context, indent + 2, out)?,
            }
        }
        Ok(())
    }
}

fn describe(
    node: &dyn FilesystemObject,
    kind: &str,
    renderer: &dyn TemplateRenderer,
    context: Option<&Context>,
) -> Result<String> {
    let rendered = match context {
        Some(context) => node
            .name()
            .resolve(renderer, context)?
            .unwrap_or_else(|| "<none>".to_string()),
        None => format!("{:?}", node.name()),
    };
    let id = node.id().map(|id| format!("id: {id}, ")).unwrap_or_default();
    Ok(format!("{rendered} = {kind}({id}name: {:?})", node.name()))
}

fn check_unique_ids(contents: &[Node]) -> Result<()> {
    let mut seen = HashSet::new();
    for id in contents.iter().filter_map(|node| node.id()) {
        if !seen.insert(id) {
            return Err(Error::DuplicateId { id: id.to_string() });
        }
    }
    Ok(())
}

impl FilesystemObject for Folder {
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
        let Some(path) = self.path(renderer, base_path, context, override_path)? else {
            return Ok(tree);
        };
        debug!("Creating directory: {}", path.display());
        fs::create_dir_all(&path)?;
        let mut children = Tree::new();
        for child in &self.contents {
            children.extend(child.materialize(renderer, &path, context, None)?);
        }
        tree.insert(path, Rendered::Folder(children));
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
        let Some(path) = self.path(renderer, base_path, context, override_path)? else {
            return Ok(tree);
        };
        let mut children = Tree::new();
        for child in &self.contents {
            children.extend(child.preview(renderer, &path, context, None)?);
        }
        tree.insert(path, Rendered::Folder(children));
        Ok(tree)
    }

    /// Buckets every descendant, then the folder itself.
    ///
    /// The folder lands in exactly one bucket: `missing` when absent, `ok` when it is
    /// a directory and every descendant is clean, `errors` otherwise. Descendants of
    /// a missing folder are still bucketed individually.
    fn verify(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Report> {
        let mut report = Report::default();
        let Some(path) = self.path(renderer, base_path, context, override_path)? else {
            return Ok(report);
        };
        for child in &self.contents {
            report.extend(child.verify(renderer, &path, context, None)?);
        }
        if !path.exists() {
            report.missing.push(path);
        } else if path.is_dir() && report.is_clean() {
            report.ok.push(path);
        } else {
            report.errors.push(path);
        }
        Ok(report)
    }
}
