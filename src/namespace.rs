//! Namespace validation for hierarchical repository names.
//!
//! A name is tokenized on a set of delimiters and matched level by level against a
//! nested grammar of allowed segments. Mismatches are reported as `(false, message)`
//! pairs, leaving enforcement to the caller (see [`ValidationLevel`]).

use crate::constants::{DELIMITERS, REPO_SEPARATOR};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grammar for one level of a namespace.
pub type NamespaceSpec = Vec<NamespaceEntry>;

/// An allowed segment, optionally with its own sub-levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamespaceEntry {
    Segment(String),
    Branch(IndexMap<String, NamespaceSpec>),
}

/// How strictly a naming mismatch is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Mismatches are errors.
    Strict,
    /// Mismatches are logged.
    #[default]
    Warn,
    /// Mismatches are ignored.
    #[serde(rename = "none")]
    #[value(name = "none")]
    Ignore,
}

/// Persisted form of a namespace grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacesFile {
    pub options: Option<NamespaceSpec>,
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<String>,
    #[serde(default = "default_repo_separator")]
    pub repo_separator: String,
}

fn default_delimiters() -> Vec<String> {
    DELIMITERS.iter().map(|d| d.to_string()).collect()
}

fn default_repo_separator() -> String {
    REPO_SEPARATOR.to_string()
}

#[derive(Debug, Clone)]
pub struct NamespaceValidator {
    options: Option<NamespaceSpec>,
    repo_separator: String,
    delimiters: Vec<String>,
    pattern: Regex,
}

impl NamespaceValidator {
    /// Builds a validator; `repo_separator` is added to `delimiters` if missing.
    pub fn new(
        options: Option<NamespaceSpec>,
        mut delimiters: Vec<String>,
        repo_separator: impl Into<String>,
    ) -> Result<Self> {
        let repo_separator = repo_separator.into();
        if repo_separator.is_empty() {
            return Err(Error::NamespaceError("repo separator must not be empty".to_string()));
        }
        if delimiters.iter().any(|d| d.is_empty()) {
            return Err(Error::NamespaceError("delimiters must not be empty strings".to_string()));
        }
        if !delimiters.contains(&repo_separator) {
            delimiters.push(repo_separator.clone());
        }
        let alternation = delimiters.iter().map(|d| regex::escape(d)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&alternation).map_err(|e| Error::NamespaceError(e.to_string()))?;
        Ok(Self { options, repo_separator, delimiters, pattern })
    }

    /// Validator with the default delimiters and separator.
    pub fn with_options(options: Option<NamespaceSpec>) -> Result<Self> {
        Self::new(options, default_delimiters(), REPO_SEPARATOR)
    }

    pub fn from_file(file: NamespacesFile) -> Result<Self> {
        Self::new(file.options, file.delimiters, file.repo_separator)
    }

    /// Parses the YAML document form; malformed options are construction errors.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: NamespacesFile =
            serde_yaml::from_str(content).map_err(|e| Error::NamespaceError(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading namespaces from {}", path.display());
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn to_file(&self) -> NamespacesFile {
        NamespacesFile {
            options: self.options.clone(),
            delimiters: self.delimiters.clone(),
            repo_separator: self.repo_separator.clone(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_yaml::to_string(&self.to_file())?)?;
        Ok(())
    }

    pub fn options(&self) -> Option<&NamespaceSpec> {
        self.options.as_ref()
    }

    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    pub fn repo_separator(&self) -> &str {
        &self.repo_separator
    }

    /// Options that actually constrain names; an empty grammar constrains nothing.
    fn constraints(&self) -> Option<&NamespaceSpec> {
        self.options.as_ref().filter(|options| !options.is_empty())
    }

    /// Splits `name` into namespace parts; unconstrained names are not tokenized.
    pub fn to_parts(&self, name: &str) -> Vec<String> {
        if self.constraints().is_some() {
            self.pattern.split(name).map(str::to_string).collect()
        } else {
            vec![name.to_string()]
        }
    }

    /// Rejoins the parts of `name` with the repo separator.
    pub fn to_repo_name(&self, name: &str) -> String {
        self.to_parts(name).join(self.repo_separator.as_str())
    }

    /// Checks `name` against the grammar, naming the first level that does not match.
    pub fn validate_name(&self, name: &str) -> (bool, String) {
        let Some(options) = self.constraints() else {
            return (true, "no constraints set".to_string());
        };
        let parts = self.to_parts(name);
        let (result, message) = self.validate_level(&parts, options);
        (result, message.replacen("{key}", "<root>", 1))
    }

    fn validate_level(&self, parts: &[String], level: &NamespaceSpec) -> (bool, String) {
        let current = parts.first();
        let mut not_matched: Vec<&str> = Vec::new();
        for entry in level {
            match entry {
                NamespaceEntry::Branch(branches) => {
                    for (segment, sub_level) in branches {
                        if current == Some(segment) {
                            let (result, message) = self.validate_level(&parts[1..], sub_level);
                            return (result, message.replacen("{key}", segment, 1));
                        }
                        not_matched.push(segment);
                    }
                }
                NamespaceEntry::Segment(segment) if current == Some(segment) => {
                    return (true, "ok".to_string());
                }
                NamespaceEntry::Segment(segment) => not_matched.push(segment),
            }
        }
        (
            false,
            format!(
                "Does not match valid names for {{key}}: {}, with delimiters: {}",
                not_matched.join(", "),
                self.delimiters_repr()
            ),
        )
    }

    fn delimiters_repr(&self) -> String {
        let quoted: Vec<String> = self.delimiters.iter().map(|d| format!("'{d}'")).collect();
        format!("[{}]", quoted.join(", "))
    }

    /// Applies `level` to the outcome of [`NamespaceValidator::validate_name`].
    pub fn enforce(&self, name: &str, level: ValidationLevel) -> Result<()> {
        let (valid, message) = self.validate_name(name);
        match (valid, level) {
            (true, _) | (false, ValidationLevel::Ignore) => Ok(()),
            (false, ValidationLevel::Warn) => {
                warn!("Name '{}' is not in the namespace: {}", name, message);
                Ok(())
            }
            (false, ValidationLevel::Strict) => {
                Err(Error::ValidationError(format!("name '{name}' is not in the namespace: {message}")))
            }
        }
    }
}
