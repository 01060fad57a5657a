//! Python repository recipes.
//!
//! Every recipe shares the same declared fields ([`PythonFields`]) and the same
//! base ingredients; the API service and recipe-package recipes splice their extra
//! sources into the package layout's `src_path` folder.

use crate::constants::{REPO_SEPARATOR, TOOL_VERSION};
use crate::context::{with_properties, Declarative, Parameter, Property};
use crate::error::{Error, Result};
use crate::hooks::{GitInit, PrecommitInstall};
use crate::mixer::{license_file, Blueprint, File, Folder, LicenseOption, Node, Recipe};
use crate::resources::{EmbeddedResources, Resource};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const INGREDIENTS: &str = "kiln.recipes.python.ingredients";
const API: &str = "kiln.recipes.python.ingredients.api";
const DOCKER: &str = "kiln.recipes.python.ingredients.api.docker";
const DOCS: &str = "kiln.recipes.python.ingredients.docs";
const RECIPE: &str = "kiln.recipes.python.ingredients.recipe";

const TEST_PLACEHOLDER: &str = "import {{repo.py_name}}


def test_placeholder():
    pass
";

/// Registers the templates the python ingredients reference.
pub fn register_resources(resources: &mut EmbeddedResources) {
    let templates: [(&str, &str, &str); 24] = [
        (INGREDIENTS, "gitignore.template", include_str!("templates/python/gitignore.template")),
        (INGREDIENTS, "noxfile.py.template", include_str!("templates/python/noxfile.py.template")),
        (
            INGREDIENTS,
            "pre-commit-config.yaml.template",
            include_str!("templates/python/pre-commit-config.yaml.template"),
        ),
        (INGREDIENTS, "pyproject.toml.template", include_str!("templates/python/pyproject.toml.template")),
        (INGREDIENTS, "readme.md.template", include_str!("templates/python/readme.md.template")),
        (INGREDIENTS, "__init__.py.template", include_str!("templates/python/__init__.py.template")),
        (API, "pyproject.toml.template", include_str!("templates/python/api/pyproject.toml.template")),
        (API, "readme.md.template", include_str!("templates/python/api/readme.md.template")),
        (API, "app.py.template", include_str!("templates/python/api/app.py.template")),
        (API, "auth.py.template", include_str!("templates/python/api/auth.py.template")),
        (API, "server.py.template", include_str!("templates/python/api/server.py.template")),
        (API, "api.__init__.py.template", include_str!("templates/python/api/api.__init__.py.template")),
        (API, "api.base.py.template", include_str!("templates/python/api/api.base.py.template")),
        (DOCKER, "api.Dockerfile.template", include_str!("templates/python/api/docker/api.Dockerfile.template")),
        (DOCKER, "dockerignore.template", include_str!("templates/python/api/docker/dockerignore.template")),
        (DOCS, "index.md.template", include_str!("templates/python/docs/index.md.template")),
        (DOCS, "usage.md.template", include_str!("templates/python/docs/usage.md.template")),
        (
            DOCS,
            "developing_index.md.template",
            include_str!("templates/python/docs/developing_index.md.template"),
        ),
        (DOCS, "license.md.template", include_str!("templates/python/docs/license.md.template")),
        (DOCS, "mkdocs.yml.template", include_str!("templates/python/docs/mkdocs.yml.template")),
        (RECIPE, "pyproject.toml.template", include_str!("templates/python/recipe/pyproject.toml.template")),
        (RECIPE, "readme.md.template", include_str!("templates/python/recipe/readme.md.template")),
        (RECIPE, "recipe.py.template", include_str!("templates/python/recipe/recipe.py.template")),
        (
            RECIPE,
            "ingredient.py.template.template",
            include_str!("templates/python/recipe/ingredient.py.template.template"),
        ),
    ];
    for (module, filename, content) in templates {
        resources.insert(module, filename, content);
    }
}

/// Git settings for the created repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_initial_branch_name")]
    pub initial_branch_name: String,
    #[serde(default = "default_git_flow")]
    pub git_flow: bool,
}

fn default_initial_branch_name() -> String {
    "main".to_string()
}

fn default_git_flow() -> bool {
    true
}

impl Default for GitConfig {
    fn default() -> Self {
        Self { initial_branch_name: default_initial_branch_name(), git_flow: default_git_flow() }
    }
}

impl GitConfig {
    /// `develop` under git flow, otherwise the initial branch.
    pub fn default_branch(&self) -> &str {
        if self.git_flow {
            "develop"
        } else {
            &self.initial_branch_name
        }
    }
}

impl Declarative for GitConfig {
    fn properties() -> Vec<Property<Self>> {
        vec![Property::new("default_branch", |git| json!(git.default_branch()))]
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::optional("initial_branch_name", "String", json!("main")),
            Parameter::optional("git_flow", "bool", json!(true)),
        ]
    }
}

/// Repository and package metadata.
///
/// `name` is not a declared field: it is copied from the recipe name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default = "default_repo_separator")]
    pub repo_separator: String,
    pub owner: String,
    pub email: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(skip)]
    name: String,
}

fn default_repo_separator() -> String {
    REPO_SEPARATOR.to_string()
}

impl RepoMetadata {
    pub fn new(owner: &str, email: &str, url: &str) -> Self {
        Self {
            repo_separator: default_repo_separator(),
            owner: owner.to_string(),
            email: email.to_string(),
            description: String::new(),
            url: url.to_string(),
            name: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn parts(&self) -> Vec<&str> {
        self.name.split(self.repo_separator.as_str()).collect()
    }

    /// Dotted python module name.
    pub fn py_name(&self) -> String {
        self.parts().join(".")
    }

    /// Top-level python package.
    pub fn py_root(&self) -> String {
        self.parts().first().copied().unwrap_or_default().to_string()
    }

    /// Package folder below `src/`.
    pub fn src_path(&self) -> String {
        self.parts().join("/")
    }

    pub fn module_depth(&self) -> usize {
        self.parts().len()
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::RecipeArgumentsError(format!("repo: {reason}"));
        if self.repo_separator.is_empty() {
            return Err(invalid("repo_separator must not be empty".to_string()));
        }
        match self.email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
            _ => return Err(invalid(format!("'{}' is not a valid email address", self.email))),
        }
        let url = url::Url::parse(&self.url).map_err(|e| invalid(format!("'{}' is not a valid url: {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("'{}' is not an http(s) url", self.url)));
        }
        Ok(())
    }
}

impl Declarative for RepoMetadata {
    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::new("name", |repo| json!(repo.name)),
            Property::new("py_name", |repo| json!(repo.py_name())),
            Property::new("py_root", |repo| json!(repo.py_root())),
            Property::new("src_path", |repo| json!(repo.src_path())),
            Property::new("module_depth", |repo| json!(repo.module_depth())),
        ]
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::optional("repo_separator", "String", json!(REPO_SEPARATOR)),
            Parameter::required("owner", "String"),
            Parameter::required("email", "String"),
            Parameter::optional("description", "String", json!("")),
            Parameter::required("url", "String"),
        ]
    }
}

/// Fields shared by every python recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonFields {
    #[serde(serialize_with = "with_properties")]
    pub repo: RepoMetadata,
    #[serde(default, serialize_with = "with_properties")]
    pub git: GitConfig,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub license: Option<LicenseOption>,
    /// Copyright year written into the license file.
    #[serde(default = "current_year")]
    pub license_year: i32,
}

fn default_language() -> String {
    "python".to_string()
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

impl PythonFields {
    pub fn new(repo: RepoMetadata) -> Self {
        Self {
            repo,
            git: GitConfig::default(),
            language: default_language(),
            license: None,
            license_year: current_year(),
        }
    }

    /// Copyright holder written into the license file.
    pub fn license_holder(&self) -> String {
        format!("{} Developers", self.repo.name())
    }
}

impl AsRef<PythonFields> for PythonFields {
    fn as_ref(&self) -> &PythonFields {
        self
    }
}

/// Derived fields of every recipe built on [`PythonFields`].
fn python_properties<T: AsRef<PythonFields>>() -> Vec<Property<T>> {
    vec![Property::new("license_holder", |fields: &T| json!(fields.as_ref().license_holder()))]
}

impl Declarative for PythonFields {
    fn properties() -> Vec<Property<Self>> {
        python_properties()
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::nested::<RepoMetadata>("repo", None),
            Parameter::nested::<GitConfig>(
                "git",
                Some(json!({"initial_branch_name": "main", "git_flow": true})),
            ),
            Parameter::optional("language", "String", json!("python")),
            Parameter::optional("license", "Option<LicenseOption>", Value::Null),
            Parameter::optional("license_year", "i32", json!(current_year())),
        ]
    }
}

/// A python package: sources under `src/`, tests, docs and tooling config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageRecipe(pub PythonFields);

impl AsRef<PythonFields> for PackageRecipe {
    fn as_ref(&self) -> &PythonFields {
        &self.0
    }
}

impl Declarative for PackageRecipe {
    fn properties() -> Vec<Property<Self>> {
        python_properties()
    }

    fn parameters() -> Vec<Parameter> {
        PythonFields::parameters()
    }
}

impl Blueprint for PackageRecipe {
    fn into_recipe(mut self, name: String) -> Result<Recipe> {
        self.0.repo.set_name(name.as_str());
        self.0.repo.validate()?;
        python_recipe(name, self, package_contents()?)
    }
}

/// A FastAPI service: the package layout plus app sources and a Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiRecipe(pub PythonFields);

impl AsRef<PythonFields> for ApiRecipe {
    fn as_ref(&self) -> &PythonFields {
        &self.0
    }
}

impl Declarative for ApiRecipe {
    fn properties() -> Vec<Property<Self>> {
        python_properties()
    }

    fn parameters() -> Vec<Parameter> {
        PythonFields::parameters()
    }
}

impl Blueprint for ApiRecipe {
    fn into_recipe(mut self, name: String) -> Result<Recipe> {
        self.0.repo.set_name(name.as_str());
        self.0.repo.validate()?;
        python_recipe(name, self, api_contents()?)
    }
}

/// A package of recipes: the package layout plus a recipe module and a sample ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeRecipe(pub PythonFields);

impl AsRef<PythonFields> for RecipeRecipe {
    fn as_ref(&self) -> &PythonFields {
        &self.0
    }
}

impl Declarative for RecipeRecipe {
    fn properties() -> Vec<Property<Self>> {
        python_properties()
    }

    fn parameters() -> Vec<Parameter> {
        PythonFields::parameters()
    }
}

impl Blueprint for RecipeRecipe {
    fn into_recipe(mut self, name: String) -> Result<Recipe> {
        self.0.repo.set_name(name.as_str());
        self.0.repo.validate()?;
        python_recipe(name, self, recipe_contents()?)
    }
}

fn python_recipe<B: Blueprint>(name: String, fields: B, contents: Vec<Node>) -> Result<Recipe> {
    Ok(Recipe::with_fields(name, fields, contents)?
        .with_version(TOOL_VERSION)
        .with_post_hook(GitInit)
        .with_post_hook(PrecommitInstall))
}

fn ingredient(name: &str, module: &str, template: &str) -> Result<File> {
    Ok(File::new(name, Resource::new(&format!("{module}:{template}"))?))
}

fn test_dir() -> Result<Folder> {
    Folder::new(
        "tests",
        vec![
            Folder::new("unit", vec![File::new("test_placeholder.py", TEST_PLACEHOLDER).into()])?.into(),
            Folder::new("functional", vec![File::new(".git-keep", "").into()])?.into(),
        ],
    )
}

fn src_dir() -> Result<Folder> {
    let package = Folder::new(
        "{{repo.src_path}}",
        vec![ingredient("__init__.py", INGREDIENTS, "__init__.py.template")?.into()],
    )?
    .with_id("src_path");
    Folder::new("src", vec![package.into()])
}

fn docs_dir() -> Result<Folder> {
    let developing = Folder::new(
        "developing",
        vec![
            ingredient("index.md", DOCS, "developing_index.md.template")?.into(),
            ingredient("license.md", DOCS, "license.md.template")?.into(),
        ],
    )?;
    let source = Folder::new(
        "source",
        vec![
            ingredient("index.md", DOCS, "index.md.template")?.into(),
            ingredient("usage.md", DOCS, "usage.md.template")?.into(),
            developing.into(),
        ],
    )?;
    Folder::new("docs", vec![source.into(), ingredient("mkdocs.yml", DOCS, "mkdocs.yml.template")?.into()])
}

fn tooling() -> Result<Vec<Node>> {
    Ok(vec![
        ingredient(".gitignore", INGREDIENTS, "gitignore.template")?.into(),
        ingredient("noxfile.py", INGREDIENTS, "noxfile.py.template")?.into(),
        ingredient(".pre-commit-config.yaml", INGREDIENTS, "pre-commit-config.yaml.template")?.into(),
    ])
}

/// Contents of the python package recipe.
pub fn package_contents() -> Result<Vec<Node>> {
    let mut contents = tooling()?;
    contents.extend([
        Node::from(ingredient("pyproject.toml", INGREDIENTS, "pyproject.toml.template")?),
        ingredient("README.md", INGREDIENTS, "readme.md.template")?.into(),
        test_dir()?.into(),
        src_dir()?.into(),
        docs_dir()?.into(),
        license_file().into(),
    ]);
    Ok(contents)
}

/// Contents of the API service recipe.
pub fn api_contents() -> Result<Vec<Node>> {
    let mut src = src_dir()?;
    src.folder_mut("src_path")?.extend([
        Node::from(ingredient("app.py", API, "app.py.template")?),
        ingredient("auth.py", API, "auth.py.template")?.into(),
        ingredient("server.py", API, "server.py.template")?.into(),
        Folder::new(
            "api",
            vec![
                ingredient("__init__.py", API, "api.__init__.py.template")?.into(),
                ingredient("base.py", API, "api.base.py.template")?.into(),
            ],
        )?
        .into(),
    ])?;

    let mut contents = tooling()?;
    contents.extend([
        Node::from(ingredient("pyproject.toml", API, "pyproject.toml.template")?),
        ingredient("README.md", API, "readme.md.template")?.into(),
        test_dir()?.into(),
        src.into(),
        ingredient(".dockerignore", DOCKER, "dockerignore.template")?.into(),
        ingredient("Dockerfile", DOCKER, "api.Dockerfile.template")?.into(),
        docs_dir()?.into(),
        license_file().into(),
    ]);
    Ok(contents)
}

/// Contents of the recipe-package recipe.
pub fn recipe_contents() -> Result<Vec<Node>> {
    let mut src = src_dir()?;
    src.folder_mut("src_path")?.extend([
        ingredient("recipe.py", RECIPE, "recipe.py.template")?,
        ingredient("ingredient.py.template", RECIPE, "ingredient.py.template.template")?,
    ])?;

    let mut contents = tooling()?;
    contents.extend([
        Node::from(ingredient("pyproject.toml", RECIPE, "pyproject.toml.template")?),
        ingredient("README.md", RECIPE, "readme.md.template")?.into(),
        test_dir()?.into(),
        src.into(),
        docs_dir()?.into(),
        license_file().into(),
    ]);
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> RepoMetadata {
        let mut repo = RepoMetadata::new("Jane", "jane@example.com", "https://example.com/jane/repo");
        repo.set_name(name);
        repo
    }

    #[test]
    fn test_derived_module_names() {
        let repo = repo("acme-tools-widgets");
        assert_eq!(repo.py_name(), "acme.tools.widgets");
        assert_eq!(repo.py_root(), "acme");
        assert_eq!(repo.src_path(), "acme/tools/widgets");
        assert_eq!(repo.module_depth(), 3);
    }

    #[test]
    fn test_default_branch_follows_git_flow() {
        let mut git = GitConfig::default();
        assert_eq!(git.default_branch(), "develop");
        git.git_flow = false;
        assert_eq!(git.default_branch(), "main");
    }

    #[test]
    fn test_metadata_validation() {
        assert!(repo("a").validate().is_ok());
        let mut bad_email = repo("a");
        bad_email.email = "jane".to_string();
        assert!(bad_email.validate().is_err());
        let mut bad_url = repo("a");
        bad_url.url = "ftp://example.com".to_string();
        assert!(bad_url.validate().is_err());
    }
}
