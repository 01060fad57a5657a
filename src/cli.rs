//! Command-line interface implementation for kiln.
//! Provides argument parsing and help text formatting using clap.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::namespace::ValidationLevel;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Command-line arguments structure for kiln.
#[derive(Parser, Debug)]
#[command(author, version, about = "kiln: recipe-driven repository scaffolding", long_about = None)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding kiln.json / kiln.yml / kiln.yaml (default: current directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a repository from a recipe
    Create(RecipeArgs),
    /// Show the files a recipe would create, without writing anything
    Dryrun(RecipeArgs),
    /// Compare a created repository with its recipe
    Validate(RecipeArgs),
    /// List the registered recipes
    List,
    /// Show the parameters a recipe accepts
    Inspect(InspectArgs),
    /// Check a name against the configured namespaces
    CheckName(CheckNameArgs),
}

#[derive(clap::Args, Debug)]
pub struct RecipeArgs {
    /// Registered recipe name
    #[arg(value_name = "RECIPE")]
    pub recipe: String,

    /// Directory the repository is created in (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Repository name
    #[arg(short, long)]
    pub name: String,

    /// JSON or YAML file with recipe arguments
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Recipe argument, dotted keys address nested fields (e.g. repo.owner=Jane)
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, Value)>,

    /// Fail instead of prompting for missing required arguments
    #[arg(long)]
    pub no_input: bool,

    /// Override the configured naming enforcement
    #[arg(long, value_enum)]
    pub naming: Option<ValidationLevel>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Registered recipe name
    #[arg(value_name = "RECIPE")]
    pub recipe: String,

    /// Include parameters whose name starts with an underscore
    #[arg(long)]
    pub include_private: bool,

    /// Include the folder-level parameters (id, contents)
    #[arg(long)]
    pub include_folder: bool,

    /// Include the recipe-level parameters (name, version, hooks)
    #[arg(long)]
    pub include_base: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckNameArgs {
    /// Name to validate
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Namespaces YAML document (default: the configured one)
    #[arg(long, value_name = "FILE")]
    pub namespaces: Option<PathBuf>,
}

/// Parses a `KEY=VALUE` pair.
///
/// Values are strings unless they look like JSON booleans, null, arrays or objects.
pub fn parse_key_value(s: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let looks_like_json = matches!(value, "true" | "false" | "null") || value.starts_with(['[', '{']);
    let value = if looks_like_json {
        serde_json::from_str(value).map_err(|e| format!("invalid value for '{key}': {e}"))?
    } else {
        Value::String(value.to_string())
    };
    Ok((key.to_string(), value))
}

/// Sets `value` at the dotted `key`, creating intermediate objects.
pub fn insert_path(context: &mut Context, key: &str, value: Value) -> Result<()> {
    match key.split_once('.') {
        None => {
            context.insert(key.to_string(), value);
            Ok(())
        }
        Some((head, rest)) => {
            let entry = context.entry(head.to_string()).or_insert_with(|| Value::Object(Context::new()));
            match entry {
                Value::Object(inner) => insert_path(inner, rest, value),
                _ => Err(Error::ConfigError(format!("'{head}' is not a mapping, cannot set '{key}'"))),
            }
        }
    }
}

/// Recursively merges `overlay` into `base`; nested mappings are merged, other values replaced.
pub fn merge_deep(base: &mut Context, overlay: Context) {
    for (key, value) in overlay {
        match value {
            Value::Object(update) if base.get(&key).is_some_and(Value::is_object) => {
                if let Some(Value::Object(inner)) = base.get_mut(&key) {
                    merge_deep(inner, update);
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Loads recipe arguments from a JSON or YAML mapping.
pub fn load_input<P: AsRef<Path>>(path: P) -> Result<Context> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_str(&content)?,
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Context::new()),
        _ => Err(Error::ConfigError(format!(
            "'{}' must contain a mapping of recipe arguments",
            path.as_ref().display()
        ))),
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument
                || e.kind() == ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
