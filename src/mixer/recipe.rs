//! Recipes: the entry point of a scaffold.
//!
//! A recipe is a folder plus identity, hooks and audit behaviour. Its render
//! context is derived from its declared fields; `create` runs pre-hooks,
//! materializes the tree, runs post-hooks and appends a record to the batch file
//! in the created root. `dryrun` and `validate` never run hooks.

use crate::constants::{BATCH_FILE, RECIPE_GROUP, TOOL_VERSION};
use crate::context::{
    merge, short_type_name, type_identity, Context, Declarative, FieldSet, NoFields, Origin,
    Parameter,
};
use crate::error::{Error, Result};
use crate::mixer::hook::{run_hooks, Hook};
use crate::mixer::node::{FilesystemObject, Name, Node, Report, Tree};
use crate::mixer::Folder;
use crate::registry::ExtensionRegistry;
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Keys never taken from the declared fields into the context.
const STRUCTURAL_FIELDS: [&str; 8] =
    ["contents", "id", "name", "pre_hooks", "post_hooks", "version", "extension_name", "recipe"];

/// Self-description injected into every context under `recipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeInfo {
    pub name: String,
    pub version: Option<String>,
    pub extension_name: String,
}

/// One entry of the batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub context: Context,
    pub tool_version: String,
    pub creation_time: String,
    pub recipe: RecipeInfo,
}

/// Result of [`Recipe::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct Creation {
    /// Root of the created tree, after post-hooks.
    pub path: PathBuf,
    pub tree: Tree,
}

/// Inspection filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectOptions {
    pub include_private: bool,
    pub include_folder: bool,
    pub include_base: bool,
}

pub struct Recipe {
    root: Folder,
    name: String,
    version: Option<String>,
    pre_hooks: Vec<Box<dyn Hook>>,
    post_hooks: Vec<Box<dyn Hook>>,
    extension_name: String,
    identity: String,
    fields: Box<dyn FieldSet + Send + Sync>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl Recipe {
    /// A recipe without declared fields.
    pub fn new(name: impl Into<String>, contents: Vec<Node>) -> Result<Self> {
        let mut recipe = Self::with_fields(name, NoFields {}, contents)?;
        recipe.identity = type_identity::<Recipe>();
        recipe.extension_name = short_type_name::<Recipe>().to_string();
        Ok(recipe)
    }

    /// A recipe whose context is derived from `fields`.
    ///
    /// The identity and default extension name come from the field type.
    pub fn with_fields<F>(name: impl Into<String>, fields: F, contents: Vec<Node>) -> Result<Self>
    where
        F: Declarative + Send + Sync + 'static,
    {
        let name = name.into();
        Ok(Self {
            root: Folder::new(Name::Literal(name.clone()), contents)?,
            name,
            version: None,
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            extension_name: short_type_name::<F>().to_string(),
            identity: type_identity::<F>(),
            fields: Box::new(fields),
            renderer: Arc::new(MiniJinjaRenderer::default()),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_pre_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.pre_hooks.push(Box::new(hook));
        self
    }

    pub fn with_post_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.post_hooks.push(Box::new(hook));
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn extension_name(&self) -> &str {
        &self.extension_name
    }

    pub fn set_extension_name(&mut self, extension_name: impl Into<String>) {
        self.extension_name = extension_name.into();
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        &*self.renderer
    }

    /// The root folder, for splicing extra nodes into the tree.
    pub fn folder(&self) -> &Folder {
        &self.root
    }

    pub fn folder_mut(&mut self) -> &mut Folder {
        &mut self.root
    }

    pub fn recipe_info(&self) -> RecipeInfo {
        RecipeInfo {
            name: self.identity.clone(),
            version: self.version.clone(),
            extension_name: self.extension_name.clone(),
        }
    }

    /// Derives the render context from the declared fields.
    pub fn context(&self) -> Result<Context> {
        let mut context = self.fields.dump()?;
        for key in STRUCTURAL_FIELDS {
            context.remove(key);
        }
        context.insert("recipe".to_string(), serde_json::to_value(self.recipe_info())?);
        Ok(context)
    }

    fn combined_context(&self, extra: Context) -> Result<Context> {
        Ok(merge(self.context()?, extra))
    }

    /// Creates the recipe under `base_path` (default: the working directory).
    ///
    /// Hook failures abort creation; files already written are left in place.
    pub fn create(
        &self,
        base_path: Option<&Path>,
        override_path: Option<&Path>,
        extra_context: Context,
    ) -> Result<Creation> {
        let base_path = resolve_base(base_path)?;
        let context = self.combined_context(extra_context)?;
        let recipe_path = self.recipe_path(&base_path, &context, override_path)?;

        let (recipe_path, context) = run_hooks(&self.pre_hooks, recipe_path, context)?;
        let (parent, dir_name) = split_root(&recipe_path)?;
        debug!("Creating recipe '{}' at {}", self.name, recipe_path.display());
        let tree = self.root.materialize(&*self.renderer, parent, &context, Some(dir_name))?;

        let (recipe_path, context) = run_hooks(&self.post_hooks, recipe_path, context)?;
        self.write_batch(&recipe_path, context)?;
        Ok(Creation { path: recipe_path, tree })
    }

    /// Renders what `create` would write, without touching the disk or running hooks.
    pub fn dryrun(
        &self,
        base_path: Option<&Path>,
        override_path: Option<&Path>,
        extra_context: Context,
    ) -> Result<Tree> {
        let base_path = resolve_base(base_path)?;
        let context = self.combined_context(extra_context)?;
        self.root.preview(&*self.renderer, &base_path, &context, override_path)
    }

    /// Compares a created recipe on disk with freshly rendered content.
    pub fn validate(
        &self,
        base_path: Option<&Path>,
        override_path: Option<&Path>,
        extra_context: Context,
    ) -> Result<Report> {
        let base_path = resolve_base(base_path)?;
        let context = self.combined_context(extra_context)?;
        self.root.verify(&*self.renderer, &base_path, &context, override_path)
    }

    fn recipe_path(&self, base_path: &Path, context: &Context, override_path: Option<&Path>) -> Result<PathBuf> {
        self.root
            .path(&*self.renderer, base_path, context, override_path)?
            .ok_or_else(|| Error::ValidationError(format!("recipe '{}' resolved to no path", self.name)))
    }

    /// Appends an audit record to the batch file in `folder_path`.
    ///
    /// The recorded context is the one the tree was created with: the derived
    /// context plus extra context, as left by the post-hooks. It is not the bare
    /// [`Recipe::context`], so a record is enough to recreate the same tree.
    fn write_batch(&self, folder_path: &Path, context: Context) -> Result<()> {
        let batch_path = folder_path.join(BATCH_FILE);
        let mut batch: Vec<serde_yaml::Value> = if batch_path.exists() {
            serde_yaml::from_str(&std::fs::read_to_string(&batch_path)?)?
        } else {
            Vec::new()
        };
        let record = BatchRecord {
            context,
            tool_version: TOOL_VERSION.to_string(),
            creation_time: chrono::Utc::now().to_rfc3339(),
            recipe: self.recipe_info(),
        };
        batch.push(serde_yaml::to_value(record)?);
        debug!("Writing batch record to {}", batch_path.display());
        std::fs::write(&batch_path, serde_yaml::to_string(&batch)?)?;
        Ok(())
    }

    /// Builds a registered recipe from keyword arguments and stamps its extension name.
    pub fn load<R>(registry: &R, recipe_name: &str, kwargs: Context) -> Result<Self>
    where
        R: ExtensionRegistry<dyn RecipeFactory> + ?Sized,
    {
        let factory = lookup(registry, recipe_name)?;
        let mut recipe = factory.build(kwargs)?;
        recipe.set_extension_name(recipe_name);
        Ok(recipe)
    }

    /// Reports the constructor signature of a registered recipe.
    ///
    /// Nested declarative fields are expanded one level.
    pub fn inspect<R>(registry: &R, recipe_name: &str, options: InspectOptions) -> Result<Vec<Parameter>>
    where
        R: ExtensionRegistry<dyn RecipeFactory> + ?Sized,
    {
        let factory = lookup(registry, recipe_name)?;
        Ok(factory
            .parameters()
            .iter()
            .filter(|p| options.include_private || !p.is_private())
            .filter(|p| options.include_folder || p.origin != Origin::Folder)
            .filter(|p| options.include_base || p.origin != Origin::Recipe)
            .map(Parameter::expanded)
            .collect())
    }
}

fn lookup<R>(registry: &R, recipe_name: &str) -> Result<Arc<dyn RecipeFactory>>
where
    R: ExtensionRegistry<dyn RecipeFactory> + ?Sized,
{
    registry.load(RECIPE_GROUP, recipe_name).ok_or_else(|| Error::RecipeNotFound {
        name: recipe_name.to_string(),
        available: registry.list_names(RECIPE_GROUP),
    })
}

fn resolve_base(base_path: Option<&Path>) -> Result<PathBuf> {
    match base_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

fn split_root(recipe_path: &Path) -> Result<(&Path, &Path)> {
    match (recipe_path.parent(), recipe_path.file_name()) {
        (Some(parent), Some(name)) => Ok((parent, Path::new(name))),
        _ => Err(Error::ValidationError(format!(
            "cannot create a recipe at '{}'",
            recipe_path.display()
        ))),
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("extension_name", &self.extension_name)
            .field("identity", &self.identity)
            .field("contents", &self.root.contents())
            .finish_non_exhaustive()
    }
}

impl FilesystemObject for Recipe {
    fn id(&self) -> Option<&str> {
        self.root.id()
    }

    fn name(&self) -> &Name {
        self.root.name()
    }

    fn materialize(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        self.root.materialize(renderer, base_path, context, override_path)
    }

    fn preview(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Tree> {
        self.root.preview(renderer, base_path, context, override_path)
    }

    fn verify(
        &self,
        renderer: &dyn TemplateRenderer,
        base_path: &Path,
        context: &Context,
        override_path: Option<&Path>,
    ) -> Result<Report> {
        self.root.verify(renderer, base_path, context, override_path)
    }
}

/// Constructs recipes for the registry.
pub trait RecipeFactory: Send + Sync {
    fn build(&self, kwargs: Context) -> Result<Recipe>;

    /// Every constructor-equivalent field, base levels included.
    fn parameters(&self) -> Vec<Parameter>;
}

/// A typed recipe definition: declared fields plus the tree they render into.
pub trait Blueprint: Declarative + DeserializeOwned + Send + Sync + 'static {
    fn into_recipe(self, name: String) -> Result<Recipe>;
}

/// Registry factory for a [`Blueprint`].
pub struct BlueprintFactory<B>(PhantomData<fn() -> B>);

impl<B: Blueprint> BlueprintFactory<B> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<B: Blueprint> Default for BlueprintFactory<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for registering a blueprint.
pub fn factory<B: Blueprint>() -> Arc<dyn RecipeFactory> {
    Arc::new(BlueprintFactory::<B>::new())
}

impl<B: Blueprint> RecipeFactory for BlueprintFactory<B> {
    fn build(&self, mut kwargs: Context) -> Result<Recipe> {
        let name = match kwargs.remove("name") {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(Error::RecipeArgumentsError(format!("'name' must be a string, got {other}")))
            }
            None => return Err(Error::RecipeArgumentsError("missing required field 'name'".to_string())),
        };
        let version = match kwargs.remove("version") {
            Some(Value::String(version)) => Some(version),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(Error::RecipeArgumentsError(format!(
                    "'version' must be a string, got {other}"
                )))
            }
        };
        let fields: B = serde_json::from_value(Value::Object(kwargs))
            .map_err(|e| Error::RecipeArgumentsError(e.to_string()))?;
        let mut recipe = fields.into_recipe(name)?;
        if version.is_some() {
            recipe.version = version;
        }
        Ok(recipe)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut parameters = vec![
            Parameter::optional("id", "Option<String>", Value::Null).with_origin(Origin::Folder),
            Parameter::optional("contents", "Vec<Node>", json!("<recipe contents>"))
                .with_origin(Origin::Folder),
            Parameter::required("name", "String").with_origin(Origin::Recipe),
            Parameter::optional("version", "Option<String>", Value::Null).with_origin(Origin::Recipe),
            Parameter::optional("pre_hooks", "Vec<Hook>", json!([])).with_origin(Origin::Recipe),
            Parameter::optional("post_hooks", "Vec<Hook>", json!([])).with_origin(Origin::Recipe),
        ];
        parameters.extend(B::parameters());
        parameters
    }
}
