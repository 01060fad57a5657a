//! kiln is a recipe-driven repository scaffolding system.
//! Recipes compose files and folders into a template tree that can be created on
//! disk, previewed without I/O, or verified against an existing repository, with
//! hooks around creation and namespace validation of repository names.

/// Command-line interface module for the kiln application
pub mod cli;

/// Configuration handling for the kiln CLI
/// Supports JSON and YAML formats (kiln.json, kiln.yml, kiln.yaml)
pub mod config;

/// Common constants: file names, registry groups and defaults
pub mod constants;

/// Render context derivation and recipe parameter signatures
pub mod context;

/// Error types and handling for the kiln application
pub mod error;

/// Built-in hooks run around recipe creation
pub mod hooks;

/// Template composition: files, folders, hooks and recipes
pub mod mixer;

/// Hierarchical repository name validation
pub mod namespace;

/// User input and interaction handling
pub mod prompt;

/// Built-in recipes and their embedded templates
pub mod recipes;

/// Extension registry for recipe factories
pub mod registry;

/// Template renderer and rendering functionality
pub mod renderer;

/// Packaged template resources and their loaders
pub mod resources;
