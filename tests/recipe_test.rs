use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kiln::constants::{BATCH_FILE, RECIPE_GROUP, TOOL_VERSION};
use kiln::context::{with_properties, Context, Declarative, DefaultValue, Parameter, Property};
use kiln::error::{Error, Result};
use kiln::mixer::node::{file_paths, find_content};
use kiln::mixer::{
    factory, BatchRecord, Blueprint, Content, File, Folder, Hook, InspectOptions, Recipe, RecipeFactory,
};
use kiln::registry::Registry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;

fn context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}

fn demo_recipe() -> Recipe {
    Recipe::new(
        "demo",
        vec![
            Folder::new("src", vec![File::new("__init__.py", "# pkg").into()]).unwrap().into(),
            File::new("README.md", "# {{name}}").into(),
        ],
    )
    .unwrap()
}

fn read_batch(root: &Path) -> Vec<BatchRecord> {
    serde_yaml::from_str(&fs::read_to_string(root.join(BATCH_FILE)).unwrap()).unwrap()
}

/// Records every path it is called with.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<PathBuf>>>);

impl Hook for Recorder {
    fn call(&self, recipe_path: &Path, _context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        self.0.lock().unwrap().push(recipe_path.to_path_buf());
        Ok(None)
    }
}

/// Moves the recipe to a sibling directory and adds a context key.
struct Relocate;

impl Hook for Relocate {
    fn call(&self, recipe_path: &Path, context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        let mut context = context.clone();
        context.insert("name".to_string(), json!("relocated"));
        Ok(Some((recipe_path.with_file_name("relocated"), context)))
    }
}

/// Adds a context key without moving the recipe.
struct Stamp;

impl Hook for Stamp {
    fn call(&self, recipe_path: &Path, context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        let mut context = context.clone();
        context.insert("remote".to_string(), json!("git@example.com:demo.git"));
        Ok(Some((recipe_path.to_path_buf(), context)))
    }
}

struct Fail;

impl Hook for Fail {
    fn call(&self, _: &Path, _: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        anyhow::bail!("hook exploded")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Owner {
    handle: String,
}

impl Declarative for Owner {
    fn properties() -> Vec<Property<Self>> {
        vec![Property::new("shout", |owner| json!(owner.handle.to_uppercase()))]
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::required("handle", "String")]
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DocsRecipe {
    #[serde(serialize_with = "with_properties")]
    owner: Owner,
    #[serde(default)]
    _internal: bool,
}

impl Declarative for DocsRecipe {
    fn properties() -> Vec<Property<Self>> {
        vec![Property::new("title", |docs| json!(format!("Docs by {}", docs.owner.handle)))]
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::nested::<Owner>("owner", None),
            Parameter::optional("_internal", "bool", json!(false)),
        ]
    }
}

impl Blueprint for DocsRecipe {
    fn into_recipe(self, name: String) -> Result<Recipe> {
        Recipe::with_fields(
            name,
            self,
            vec![File::new("OWNER", "{{ owner.shout }} / {{ title }} / {{ recipe.extension_name }}").into()],
        )
    }
}

fn registry() -> Registry<dyn RecipeFactory> {
    Registry::new().with(RECIPE_GROUP, "docs", factory::<DocsRecipe>())
}

#[test]
fn test_scaffold_and_verify_two_file_package() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe();

    let creation = recipe.create(Some(temp_dir.path()), None, context(json!({"name": "demo"}))).unwrap();

    let root = temp_dir.path().join("demo");
    assert_eq!(creation.path, root);
    assert_eq!(fs::read_to_string(root.join("src/__init__.py")).unwrap(), "# pkg");
    assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "# demo");

    let report = recipe.validate(Some(temp_dir.path()), None, context(json!({"name": "demo"}))).unwrap();
    assert!(report.missing.is_empty());
    assert!(report.errors.is_empty());
    let ok: HashSet<PathBuf> = report.ok.into_iter().collect();
    assert_eq!(
        ok,
        HashSet::from([root.join("src/__init__.py"), root.join("src"), root.join("README.md"), root.clone()])
    );
}

#[test]
fn test_create_twice_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe();
    let extra = context(json!({"name": "demo"}));

    let first = recipe.create(Some(temp_dir.path()), None, extra.clone()).unwrap();
    let second = recipe.create(Some(temp_dir.path()), None, extra.clone()).unwrap();
    assert_eq!(first, second);

    let report = recipe.validate(Some(temp_dir.path()), None, extra).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.ok.len(), 4);
}

#[test]
fn test_create_matches_dryrun() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe();
    let extra = context(json!({"name": "demo"}));

    let preview = recipe.dryrun(Some(temp_dir.path()), None, extra.clone()).unwrap();
    assert!(!temp_dir.path().join("demo").exists());
    let creation = recipe.create(Some(temp_dir.path()), None, extra).unwrap();

    for path in file_paths(&creation.tree) {
        assert_eq!(find_content(&preview, &path), find_content(&creation.tree, &path));
    }
    assert_eq!(preview, creation.tree);
}

#[test]
fn test_batch_file_is_appended_on_each_create() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe().with_version("1.2.3");
    let root = temp_dir.path().join("demo");

    recipe.create(Some(temp_dir.path()), None, context(json!({"name": "demo"}))).unwrap();
    assert_eq!(read_batch(&root).len(), 1);
    recipe.create(Some(temp_dir.path()), None, context(json!({"name": "demo", "run": 2}))).unwrap();

    let batch = read_batch(&root);
    assert_eq!(batch.len(), 2);
    let record = &batch[1];
    assert_eq!(record.tool_version, TOOL_VERSION);
    assert_eq!(record.context.get("run"), Some(&json!(2)));
    assert_eq!(record.recipe.name, "kiln::mixer::recipe:Recipe");
    assert_eq!(record.recipe.version.as_deref(), Some("1.2.3"));
    assert!(chrono::DateTime::parse_from_rfc3339(&record.creation_time).is_ok());
    assert!(batch[0].context.get("run").is_none());
}

#[test]
fn test_batch_record_keeps_post_hook_context() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe().with_post_hook(Stamp);

    let creation = recipe.create(Some(temp_dir.path()), None, context(json!({"name": "demo"}))).unwrap();

    let record = &read_batch(&creation.path)[0];
    assert_eq!(record.context.get("remote"), Some(&json!("git@example.com:demo.git")));
    assert_eq!(record.context.get("name"), Some(&json!("demo")));
}

#[test]
fn test_override_path_replaces_the_recipe_name() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe();

    let creation = recipe
        .create(Some(temp_dir.path()), Some(Path::new("elsewhere")), context(json!({"name": "demo"})))
        .unwrap();

    assert_eq!(creation.path, temp_dir.path().join("elsewhere"));
    assert!(temp_dir.path().join("elsewhere/README.md").exists());
    assert!(!temp_dir.path().join("demo").exists());
}

#[test]
fn test_hooks_thread_path_and_context() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let recipe = demo_recipe().with_pre_hook(Relocate).with_post_hook(recorder.clone());

    let creation = recipe.create(Some(temp_dir.path()), None, Context::new()).unwrap();

    let root = temp_dir.path().join("relocated");
    assert_eq!(creation.path, root);
    assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "# relocated");
    assert_eq!(*recorder.0.lock().unwrap(), vec![root.clone()]);
    assert_eq!(read_batch(&root)[0].context.get("name"), Some(&json!("relocated")));
}

#[test]
fn test_dryrun_and_validate_run_no_hooks() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let recipe = demo_recipe().with_pre_hook(recorder.clone()).with_post_hook(recorder.clone());

    recipe.dryrun(Some(temp_dir.path()), None, Context::new()).unwrap();
    recipe.validate(Some(temp_dir.path()), None, Context::new()).unwrap();
    assert!(recorder.0.lock().unwrap().is_empty());
}

#[test]
fn test_failing_pre_hook_aborts_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe().with_pre_hook(Fail);

    let err = recipe.create(Some(temp_dir.path()), None, Context::new()).unwrap_err();
    assert!(matches!(err, Error::HookError(_)));
    assert_eq!(err.to_string(), "hook exploded");
    assert!(!temp_dir.path().join("demo").exists());
}

#[test]
fn test_failing_post_hook_leaves_files_without_batch_record() {
    let temp_dir = TempDir::new().unwrap();
    let recipe = demo_recipe().with_post_hook(Fail);

    assert!(recipe.create(Some(temp_dir.path()), None, Context::new()).is_err());
    let root = temp_dir.path().join("demo");
    assert!(root.join("README.md").exists());
    assert!(!root.join(BATCH_FILE).exists());
}

#[test]
fn test_context_is_derived_from_declared_fields() {
    let kwargs = context(json!({"name": "handbook", "version": "0.1.0", "owner": {"handle": "ann"}}));
    let recipe = Recipe::load(&registry(), "docs", kwargs).unwrap();

    assert_eq!(recipe.name(), "handbook");
    assert_eq!(recipe.version(), Some("0.1.0"));
    assert_eq!(recipe.extension_name(), "docs");

    let ctx = recipe.context().unwrap();
    assert_eq!(ctx.get("owner"), Some(&json!({"handle": "ann", "shout": "ANN"})));
    assert_eq!(ctx.get("title"), Some(&json!("Docs by ann")));
    assert_eq!(
        ctx.get("recipe"),
        Some(&json!({"name": "recipe_test:DocsRecipe", "version": "0.1.0", "extension_name": "docs"}))
    );
    for structural in ["name", "version", "contents", "id", "pre_hooks", "post_hooks", "extension_name"] {
        assert!(!ctx.contains_key(structural), "{structural} leaked into the context");
    }

    let temp_dir = TempDir::new().unwrap();
    let tree = recipe.dryrun(Some(temp_dir.path()), None, Context::new()).unwrap();
    assert_eq!(
        find_content(&tree, &temp_dir.path().join("handbook/OWNER")),
        Some(&Content::Text("ANN / Docs by ann / docs".to_string()))
    );
}

#[test]
fn test_load_unknown_recipe_lists_available_names() {
    match Recipe::load(&registry(), "cookbook", Context::new()) {
        Err(Error::RecipeNotFound { name, available }) => {
            assert_eq!(name, "cookbook");
            assert_eq!(available, vec!["docs"]);
        }
        other => panic!("expected RecipeNotFound, got {other:?}"),
    }
    assert!(matches!(
        Recipe::inspect(&registry(), "cookbook", InspectOptions::default()),
        Err(Error::RecipeNotFound { .. })
    ));
}

#[test]
fn test_load_rejects_bad_arguments() {
    let missing_owner = context(json!({"name": "handbook"}));
    assert!(matches!(
        Recipe::load(&registry(), "docs", missing_owner),
        Err(Error::RecipeArgumentsError(_))
    ));
    let missing_name = context(json!({"owner": {"handle": "ann"}}));
    assert!(matches!(
        Recipe::load(&registry(), "docs", missing_name),
        Err(Error::RecipeArgumentsError(_))
    ));
}

#[test]
fn test_inspect_filters_and_expands() {
    let names = |options| -> Vec<&'static str> {
        Recipe::inspect(&registry(), "docs", options).unwrap().iter().map(|p| p.name).collect()
    };

    assert_eq!(names(InspectOptions::default()), vec!["owner"]);
    assert_eq!(
        names(InspectOptions { include_private: true, ..Default::default() }),
        vec!["owner", "_internal"]
    );
    assert_eq!(
        names(InspectOptions { include_base: true, ..Default::default() }),
        vec!["name", "version", "pre_hooks", "post_hooks", "owner"]
    );
    assert_eq!(
        names(InspectOptions { include_folder: true, ..Default::default() }),
        vec!["id", "contents", "owner"]
    );

    let parameters = Recipe::inspect(&registry(), "docs", InspectOptions::default()).unwrap();
    assert_eq!(parameters[0].default, DefaultValue::Signature(vec![Parameter::required("handle", "String")]));
}
