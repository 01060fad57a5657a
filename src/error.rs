//! Error handling for the kiln application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for kiln operations.
///
/// Construction errors (duplicate ids, malformed resource references, malformed
/// namespace options) are raised before any rendering or I/O takes place.
/// Verification outcomes and naming-grammar mismatches are *not* errors; they are
/// reported through [`crate::mixer::Report`] and
/// [`crate::namespace::NamespaceValidator::validate_name`].
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations.
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Errors raised by the MiniJinja engine while compiling or rendering.
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A template or packaged resource could not be resolved.
    ///
    /// This is distinct from a node resolving to no content, which is a legitimate skip.
    #[error("Template not found: '{reference}'.")]
    TemplateNotFound { reference: String },

    /// A string was declared as a template but carries no template syntax.
    #[error("Template string needs jinja syntax: '{value}'.")]
    InvalidTemplateStr { value: String },

    /// Resource reference does not look like `<module.path>:<filename>`.
    #[error("Invalid resource reference '{reference}': {reason}.")]
    InvalidResource { reference: String, reason: String },

    /// Two siblings in the same folder share an id.
    #[error("IDs for contents must be unique. The ID ({id}) already exists in the folder contents.")]
    DuplicateId { id: String },

    /// Folder lookup by id or name failed.
    #[error("Name or id '{key}' not found in contents.")]
    NodeNotFound { key: String },

    /// Registry lookup failed.
    #[error("Recipe '{name}' not found, it may be mis-spelt or not registered. Available recipes: {}.", .available.join(", "))]
    RecipeNotFound { name: String, available: Vec<String> },

    /// Recipe keyword arguments could not be turned into a recipe.
    #[error("Invalid recipe arguments: {0}.")]
    RecipeArgumentsError(String),

    /// Malformed namespace options, delimiters or separator.
    #[error("Namespace error: {0}.")]
    NamespaceError(String),

    /// Context could not be derived from the declared recipe fields.
    #[error("Context error: {0}.")]
    ContextError(String),

    /// Represents errors that occur during hook execution.
    #[error(transparent)]
    HookError(#[from] anyhow::Error),

    /// Git repository initialisation errors.
    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors that occur during configuration parsing or processing.
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents validation failures in user input or data.
    #[error("Validation error: {0}.")]
    ValidationError(String),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
