//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// How an atomic replacement actually landed on disk.
///
/// Callers branch on this data instead of classifying rename errors: a
/// non-atomic fallback is a degraded-but-complete write, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    RenamedAtomically,
    RenamedNonAtomically,
}

/// Read file contents.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(Error::Io)
}

/// Write content to `path` atomically via a sibling staging file.
///
/// The staging file gets a random suffix so concurrent invocations never
/// collide on the temp name, and lives in the same directory so the rename
/// stays on one filesystem. Readers observe either the old content or the
/// new content — never a partial write. If the rename itself fails, the
/// content is still complete in the staging file, so a copy-then-delete
/// fallback is attempted before giving up.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<ReplaceOutcome> {
    let parent = path.parent().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no parent dir for: {}", path.display()),
        ))
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid target path: {}", path.display()),
        ))
    })?;

    let tmp_path = parent.join(format!(
        "{}.tmp.{}",
        filename.to_string_lossy(),
        Uuid::new_v4()
    ));

    fs::write(&tmp_path, content)?;

    match fs::rename(&tmp_path, path) {
        Ok(()) => Ok(ReplaceOutcome::RenamedAtomically),
        Err(_) => {
            // Filesystem refused the rename; the staging file is complete,
            // so fall back to a non-atomic copy.
            let copied = fs::copy(&tmp_path, path);
            let _ = fs::remove_file(&tmp_path);
            copied?;
            Ok(ReplaceOutcome::RenamedNonAtomically)
        }
    }
}
