//! Built-in hooks run around recipe creation.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context as _};
use log::{debug, info, warn};
use serde_json::Value;

use crate::context::{merge, Context};
use crate::error::Error;
use crate::mixer::Hook;

const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

/// (Re)initialises a git repository in the created root.
///
/// The initial branch is `git.initial_branch_name` from the context, else git's
/// `init.defaultBranch`, else `main`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitInit;

impl GitInit {
    fn initial_branch(context: &Context) -> String {
        context
            .get("git")
            .and_then(|git| git.get("initial_branch_name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(configured_default_branch)
            .unwrap_or_else(|| "main".to_string())
    }
}

fn configured_default_branch() -> Option<String> {
    let config = git2::Config::open_default().ok()?;
    config.get_string("init.defaultBranch").ok().filter(|branch| !branch.trim().is_empty())
}

impl Hook for GitInit {
    fn call(&self, recipe_path: &Path, context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        let branch = Self::initial_branch(context);
        info!("Initialising git repo in {} on '{}'", recipe_path.display(), branch);
        let mut options = git2::RepositoryInitOptions::new();
        options.initial_head(&branch);
        git2::Repository::init_opts(recipe_path, &options).map_err(Error::Git2Error)?;
        info!("Done");
        Ok(None)
    }
}

/// Installs pre-commit hooks when the created root has a pre-commit config.
///
/// Skipped with a warning when `pre-commit` is not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecommitInstall;

impl Hook for PrecommitInstall {
    fn call(&self, recipe_path: &Path, _context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        if !recipe_path.join(PRE_COMMIT_CONFIG).exists() {
            info!("Precommit config file not detected, skipping.");
            return Ok(None);
        }
        info!("Installing hooks");
        let status = Command::new("pre-commit")
            .args(["install", "--install-hooks"])
            .current_dir(recipe_path)
            .status();
        match status {
            Ok(status) if status.success() => info!("Done"),
            Ok(status) => bail!("pre-commit install failed with status: {}", status),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("pre-commit is not installed, skipping hook installation");
            }
            Err(e) => return Err(e).context("failed to run pre-commit"),
        }
        Ok(None)
    }
}

/// Runs an executable inside the created root.
///
/// The context is written to its stdin as JSON. If the command prints a JSON
/// object on stdout, it is merged into the context for the following hooks.
#[derive(Debug, Clone)]
pub struct RunCommand {
    program: String,
    args: Vec<String>,
}

impl RunCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Hook for RunCommand {
    fn call(&self, recipe_path: &Path, context: &Context) -> anyhow::Result<Option<(PathBuf, Context)>> {
        debug!("Running '{}' in {}", self.program, recipe_path.display());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(recipe_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to run '{}'", self.program))?;

        // stdin is fed from its own thread while stdout is drained
        let payload = serde_json::to_vec(context)?;
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => match stdin.write_all(&payload) {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                },
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        written.map_err(|_| anyhow!("stdin writer for '{}' panicked", self.program))??;
        let output = output?;
        if !output.status.success() {
            bail!("Hook '{}' failed with status: {}", self.program, output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(Value::Object(update)) => {
                Ok(Some((recipe_path.to_path_buf(), merge(context.clone(), update))))
            }
            _ => Ok(None),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_branch_from_context() {
        let context = match json!({"git": {"initial_branch_name": "trunk"}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(GitInit::initial_branch(&context), "trunk");
    }
}
