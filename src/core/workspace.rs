//! Workspace-root discovery and the per-invocation context.
//!
//! A workspace is any directory containing a `.guardkit` marker directory.
//! Discovery walks upward from the starting directory; everything the guard
//! engine touches is sandboxed below the discovered root.

use crate::config::{self, GuardConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Workspace marker directory name.
pub const MARKER: &str = ".guardkit";

/// Everything a resolver/runner call needs, passed explicitly.
///
/// There is no global config or logger state; a fresh context is built per
/// invocation so config edits between invocations are always picked up.
#[derive(Debug, Clone)]
pub struct GuardContext {
    /// Canonicalized workspace root — the sandbox boundary.
    pub workspace_root: PathBuf,
    /// Search base: `workspace_root` joined with `config.path`.
    pub base: PathBuf,
    pub config: GuardConfig,
}

impl GuardContext {
    /// Discover the workspace upward from `start` and load its config.
    pub fn load(start: &Path) -> Result<Self> {
        let workspace_root = discover(start)?;
        let config = config::load(&workspace_root)?;
        let base = if config.path.is_empty() {
            workspace_root.clone()
        } else {
            workspace_root.join(&config.path)
        };

        Ok(GuardContext {
            workspace_root,
            base,
            config,
        })
    }

    /// Discover from the current working directory.
    pub fn load_from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    pub fn prefix(&self) -> &str {
        &self.config.guard
    }
}

/// Walk upward from `start` until a directory containing the marker is found.
pub fn discover(start: &Path) -> Result<PathBuf> {
    let start = start.canonicalize().map_err(|e| {
        Error::WorkspaceNotFound(format!("cannot resolve start dir {}: {}", start.display(), e))
    })?;

    let mut cur: Option<&Path> = Some(&start);
    while let Some(dir) = cur {
        if dir.join(MARKER).is_dir() {
            return Ok(dir.to_path_buf());
        }
        cur = dir.parent();
    }

    Err(Error::WorkspaceNotFound(format!(
        "no {} directory found upward from {} \
         (run from inside a workspace, or create {} at its root)",
        MARKER,
        start.display(),
        MARKER
    )))
}
