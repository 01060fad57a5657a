//! Common constants used throughout the kiln application.

/// Supported configuration file names
pub const CONFIG_FILES: [&str; 3] = ["kiln.json", "kiln.yml", "kiln.yaml"];

/// Audit file appended to on every recipe creation.
pub const BATCH_FILE: &str = ".recipe-batch.yaml";

/// Registry group recipes are registered under.
pub const RECIPE_GROUP: &str = "kiln.recipes";

/// Default separator used when canonicalising repository names.
pub const REPO_SEPARATOR: &str = "-";

/// Default delimiters used when tokenizing hierarchical names.
pub const DELIMITERS: [&str; 3] = [".", ",", "-"];

/// Version recorded in batch files.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
