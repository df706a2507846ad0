//! Workspace configuration (`.guardkit/config.yml`).
//!
//! The config file is re-read on every command invocation so edits between
//! invocations (notably to the `guard` prefix) take effect without restarting
//! anything. Missing keys keep their defaults; a missing file yields an
//! all-default config.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the config file inside the workspace marker directory.
pub(crate) const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Include-guard prefix prepended to the UUID suffix.
    pub guard: String,
    /// C++ namespace used by header templates.
    pub namespace: String,
    /// Base subdirectory (relative to the workspace root) that searches run under.
    pub path: String,
    /// Test source subdirectory.
    pub test: String,
    /// Debug flag string.
    pub debug: String,
}

/// Path of the config file for a given workspace root.
pub(crate) fn config_file(workspace_root: &Path) -> PathBuf {
    workspace_root
        .join(crate::workspace::MARKER)
        .join(CONFIG_FILE)
}

/// Load the workspace config, tolerating a missing file.
///
/// A file that exists but fails to parse is an error: a half-readable config
/// must never silently fall back to defaults and run with the wrong prefix.
pub(crate) fn load(workspace_root: &Path) -> Result<GuardConfig> {
    let path = config_file(workspace_root);
    if !path.is_file() {
        return Ok(GuardConfig::default());
    }

    let source = std::fs::read_to_string(&path)?;
    parse(&source).map_err(|e| Error::Yaml(format!("{}: {}", path.display(), e)))
}

fn parse(source: &str) -> std::result::Result<GuardConfig, serde_yml::Error> {
    if source.trim().is_empty() {
        return Ok(GuardConfig::default());
    }
    serde_yml::from_str(source)
}
