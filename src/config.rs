//! Configuration handling for the kiln CLI.
//! A `kiln.json`, `kiln.yml` or `kiln.yaml` in the working directory points the
//! CLI at a namespaces document, extra template resources and recipe defaults.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::namespace::{NamespaceValidator, ValidationLevel};
use crate::recipes::builtin_resources;
use crate::renderer::MiniJinjaRenderer;
use crate::resources::{ChoiceLoader, DirectoryResources, ResourceLoader};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parsed CLI configuration; every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Namespaces YAML document names are validated against.
    pub namespaces: Option<PathBuf>,
    /// How naming mismatches are enforced.
    pub naming: ValidationLevel,
    /// Directory of template resources tried before the built-in ones.
    pub resources: Option<PathBuf>,
    /// Recipe keyword arguments applied beneath the ones given on the command line.
    pub defaults: Context,
}

/// Reads the first configuration file found in `dir`.
///
/// # Arguments
/// * `dir` - Directory to look for configuration in
/// * `config_files` - List of configuration files to try
///
/// # Returns
/// * `Result<Option<(PathBuf, String)>>` - Path and contents of the first file found
pub fn load_config<P: AsRef<Path>>(dir: P, config_files: &[&str]) -> Result<Option<(PathBuf, String)>> {
    for file in config_files {
        let config_path = dir.as_ref().join(file);
        if config_path.exists() {
            debug!("Loading configuration from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            return Ok(Some((config_path, content)));
        }
    }
    Ok(None)
}

/// Parses configuration content, trying JSON first and then YAML.
///
/// # Errors
/// * `Error::ConfigError` if neither format parses
pub fn parse_config(content: &str) -> Result<Config> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {}", e))),
    }
}

/// Loads the configuration for `dir`, falling back to defaults when there is none.
///
/// Relative paths in the file are resolved against `dir`.
pub fn get_config<P: AsRef<Path>>(dir: P) -> Result<Config> {
    let dir = dir.as_ref();
    let Some((_, content)) = load_config(dir, &crate::constants::CONFIG_FILES)? else {
        debug!("No configuration found in {}, using defaults", dir.display());
        return Ok(Config::default());
    };
    let mut config = parse_config(&content)?;
    config.namespaces = config.namespaces.map(|path| dir.join(path));
    config.resources = config.resources.map(|path| dir.join(path));
    Ok(config)
}

impl Config {
    /// The configured namespace validator, if any.
    pub fn validator(&self) -> Result<Option<NamespaceValidator>> {
        self.namespaces.as_ref().map(NamespaceValidator::load).transpose()
    }

    /// Renderer resolving resources from the configured directory, then the built-in ones.
    pub fn renderer(&self) -> MiniJinjaRenderer {
        let mut loader = ChoiceLoader::default();
        if let Some(resources) = &self.resources {
            loader.push(Arc::new(DirectoryResources::new(resources)));
        }
        loader.push(Arc::new(builtin_resources()));
        let loader: Arc<dyn ResourceLoader> = Arc::new(loader);
        MiniJinjaRenderer::new(loader)
    }
}
