//! kiln's main application entry point and orchestration logic.
//! Handles command-line argument parsing and dispatches to the recipe,
//! registry and namespace operations.

use std::sync::Arc;

use kiln::{
    cli::{get_args, insert_path, load_input, merge_deep, Args, CheckNameArgs, Command, InspectArgs, RecipeArgs},
    config::{get_config, Config},
    constants::RECIPE_GROUP,
    context::Context,
    error::{default_error_handler, Error, Result},
    mixer::{node::file_paths, InspectOptions, Recipe, RecipeFactory},
    namespace::NamespaceValidator,
    prompt::{missing_parameters, prompt_missing, DialoguerPrompter},
    recipes,
    registry::{ExtensionRegistry, Registry},
};
use serde_json::Value;

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Arguments
/// * `args` - Parsed command line arguments
///
/// # Returns
/// * `Result<()>` - Success or error status of the command
fn run(args: Args) -> Result<()> {
    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = get_config(&config_dir)?;
    let registry = recipes::registry();

    match args.command {
        Command::List => {
            for name in registry.list_names(RECIPE_GROUP) {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Inspect(inspect) => run_inspect(&registry, inspect),
        Command::CheckName(check) => run_check_name(&config, check),
        Command::Create(recipe_args) => {
            let recipe = build_recipe(&registry, &config, &recipe_args)?;
            let creation = recipe.create(recipe_args.output_dir.as_deref(), None, Context::new())?;
            for path in file_paths(&creation.tree) {
                println!("Created: '{}'", path.display());
            }
            println!("Recipe '{}' created in {}.", recipe.extension_name(), creation.path.display());
            Ok(())
        }
        Command::Dryrun(recipe_args) => {
            let recipe = build_recipe(&registry, &config, &recipe_args)?;
            let tree = recipe.dryrun(recipe_args.output_dir.as_deref(), None, Context::new())?;
            for path in file_paths(&tree) {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Validate(recipe_args) => {
            let recipe = build_recipe(&registry, &config, &recipe_args)?;
            let report = recipe.validate(recipe_args.output_dir.as_deref(), None, Context::new())?;
            for (label, paths) in [("missing", &report.missing), ("differs", &report.errors), ("ok", &report.ok)] {
                for path in paths {
                    println!("{}: '{}'", label, path.display());
                }
            }
            if report.is_clean() {
                Ok(())
            } else {
                Err(Error::ValidationError(format!(
                    "{} missing, {} differing",
                    report.missing.len(),
                    report.errors.len()
                )))
            }
        }
    }
}

fn run_inspect(registry: &Registry<dyn RecipeFactory>, inspect: InspectArgs) -> Result<()> {
    let options = InspectOptions {
        include_private: inspect.include_private,
        include_folder: inspect.include_folder,
        include_base: inspect.include_base,
    };
    let parameters = Recipe::inspect(registry, &inspect.recipe, options)?;
    print!("{}", serde_yaml::to_string(&parameters)?);
    Ok(())
}

fn run_check_name(config: &Config, check: CheckNameArgs) -> Result<()> {
    let validator = match check.namespaces {
        Some(path) => NamespaceValidator::load(path)?,
        None => match config.validator()? {
            Some(validator) => validator,
            None => NamespaceValidator::with_options(None)?,
        },
    };
    let (valid, message) = validator.validate_name(&check.name);
    println!("{}: {}", if valid { "valid" } else { "invalid" }, message);
    println!("repo name: {}", validator.to_repo_name(&check.name));
    if valid {
        Ok(())
    } else {
        Err(Error::ValidationError(message))
    }
}

/// Assembles recipe arguments (configured defaults, input file, `--set` pairs),
/// enforces the naming rules and builds the recipe.
fn build_recipe(
    registry: &Registry<dyn RecipeFactory>,
    config: &Config,
    recipe_args: &RecipeArgs,
) -> Result<Recipe> {
    let name = match config.validator()? {
        Some(validator) => {
            validator.enforce(&recipe_args.name, recipe_args.naming.unwrap_or(config.naming))?;
            validator.to_repo_name(&recipe_args.name)
        }
        None => recipe_args.name.clone(),
    };

    let mut kwargs = config.defaults.clone();
    if let Some(input) = &recipe_args.input {
        merge_deep(&mut kwargs, load_input(input)?);
    }
    for (key, value) in &recipe_args.set {
        insert_path(&mut kwargs, key, value.clone())?;
    }

    let parameters = Recipe::inspect(registry, &recipe_args.recipe, InspectOptions::default())?;
    if recipe_args.no_input {
        let missing = missing_parameters(&parameters, &kwargs);
        if !missing.is_empty() {
            return Err(Error::RecipeArgumentsError(format!(
                "missing required arguments: {}",
                missing.join(", ")
            )));
        }
    } else {
        prompt_missing(&DialoguerPrompter::new(), &parameters, &mut kwargs)?;
    }
    kwargs.insert("name".to_string(), Value::String(name));

    let recipe = Recipe::load(registry, &recipe_args.recipe, kwargs)?;
    Ok(recipe.with_renderer(Arc::new(config.renderer())))
}
