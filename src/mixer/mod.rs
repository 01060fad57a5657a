//! Building blocks to compose repository templates and mix (instantiate) them.
//!
//! Files and folders form a tree that supports three operations sharing one
//! rendering path: materialize (write to disk), preview (render without I/O) and
//! verify (compare disk to freshly rendered content).

pub mod file;
pub mod folder;
pub mod hook;
pub mod license;
pub mod node;
pub mod recipe;

pub use file::{File, Source};
pub use folder::Folder;
pub use hook::{run_hooks, Hook};
pub use license::{license_file, LicenseOption};
pub use node::{Content, FilesystemObject, Name, Node, Rendered, Report, Tree};
pub use recipe::{
    factory, BatchRecord, Blueprint, BlueprintFactory, Creation, InspectOptions, Recipe,
    RecipeFactory, RecipeInfo,
};
