//! Target resolution and sandboxing.
//!
//! Turns a `TargetSpec` into exactly one existing file or directory, always
//! inside the workspace root. Ambiguity (several files or directories with
//! the matching name) is never guessed away: candidates are listed and the
//! caller must rerun with a 1-based `--pick`.

use super::{LineSink, TargetSpec};
use crate::error::{Error, Result};
use crate::workspace::GuardContext;
use std::path::{Path, PathBuf};

/// Directory candidates listed before the pick hint.
const DIR_CANDIDATE_LIMIT: usize = 50;
/// File candidates listed before the pick hint.
const FILE_CANDIDATE_LIMIT: usize = 20;
/// Hard cap on collected file matches.
const FILE_MATCH_CAP: usize = 50;

/// A resolved, sandbox-checked target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    File(PathBuf),
    Tree(PathBuf),
}

/// Resolve `spec` against the context. `rerun_flags` is the non-target part
/// of the invocation, echoed back in copy-paste pick hints.
pub fn resolve(
    ctx: &GuardContext,
    spec: &TargetSpec,
    rerun_flags: &str,
    sink: &mut dyn LineSink,
) -> Result<ResolvedTarget> {
    match spec {
        TargetSpec::File { input, pick } => {
            resolve_file(ctx, input, *pick, rerun_flags, sink).map(ResolvedTarget::File)
        }
        TargetSpec::All => {
            let root = sandboxed_dir(ctx, &ctx.base)?;
            Ok(ResolvedTarget::Tree(root))
        }
        TargetSpec::Dir(path) => resolve_dir(ctx, path).map(ResolvedTarget::Tree),
        TargetSpec::DirName { name, pick } => {
            resolve_dir_name(ctx, name, *pick, sink).map(ResolvedTarget::Tree)
        }
    }
}

/// Resolve `--dir`: absolute paths as-is, relative paths first against the
/// workspace root, then against the configured base.
fn resolve_dir(ctx: &GuardContext, path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::Usage("--dir is empty".to_string()));
    }

    if path.is_absolute() {
        return sandboxed_dir(ctx, path);
    }

    let cand1 = ctx.workspace_root.join(path);
    let cand2 = ctx.base.join(path);

    if cand1.is_dir() {
        sandboxed_dir(ctx, &cand1)
    } else if cand2.is_dir() {
        sandboxed_dir(ctx, &cand2)
    } else {
        Err(Error::Resolve(format!(
            "root is not a directory: {} (also tried: {})",
            cand1.display(),
            cand2.display()
        )))
    }
}

/// Resolve `--dir-name`: recursive case-insensitive basename search under
/// the configured base.
fn resolve_dir_name(
    ctx: &GuardContext,
    name: &str,
    pick: Option<usize>,
    sink: &mut dyn LineSink,
) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(Error::Usage("--dir-name is empty".to_string()));
    }

    let base = sandboxed_dir(ctx, &ctx.base)?;

    let mut candidates = Vec::new();
    collect_dirs_by_name(&base, name, &mut candidates);

    if candidates.is_empty() {
        return Err(Error::Resolve(format!(
            "dir-name not found under base: {} (name: {})",
            base.display(),
            name
        )));
    }

    // Stable 1-based indices for --pick.
    candidates.sort_by_key(|p| relative_lower(&base, p));

    if candidates.len() == 1 {
        return sandboxed_dir(ctx, &candidates[0]);
    }

    sink.warn(&format!("multiple directories matched name: {}", name));
    for (i, cand) in candidates.iter().take(DIR_CANDIDATE_LIMIT).enumerate() {
        sink.warn(&format!("  {}) {}", i + 1, relative_display(&base, cand)));
    }
    sink.warn(&format!(
        "use --pick <1..{}> to select one.",
        candidates.len()
    ));

    let chosen = picked(&candidates, pick)?;
    sandboxed_dir(ctx, chosen)
}

/// Resolve `--file`.
///
/// An input with a path separator that names an existing regular file
/// (absolute or workspace-relative) is taken directly. Anything else is
/// treated as a bare `.h` filename and searched for under the configured
/// base, excluding `package-info.h`.
fn resolve_file(
    ctx: &GuardContext,
    input: &str,
    pick: Option<usize>,
    rerun_flags: &str,
    sink: &mut dyn LineSink,
) -> Result<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Usage("--file is empty".to_string()));
    }

    // 1) Try as a path, absolute or relative to the workspace root.
    if !is_bare_file_name(input) {
        let p = Path::new(input);
        let candidate = if p.is_absolute() {
            p.to_path_buf()
        } else {
            ctx.workspace_root.join(p)
        };
        if candidate.is_file() {
            return sandboxed_file(ctx, &candidate);
        }
    }

    // 2) Fall back to a bare-name search under the base. Conservatively use
    //    only the last path segment.
    let name = Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(Error::Resolve(format!("invalid file name: {}", input)));
    }

    if !name.to_lowercase().ends_with(".h") {
        return Err(Error::Resolve(format!(
            "guard --file expects a .h file name (got: {})",
            name
        )));
    }
    if name.eq_ignore_ascii_case("package-info.h") {
        return Err(Error::Resolve("package-info.h is excluded".to_string()));
    }

    let base = sandboxed_dir(ctx, &ctx.base)?;

    let mut matches = Vec::new();
    collect_files_by_name(&base, &name, &mut matches);

    if matches.is_empty() {
        return Err(Error::Resolve(format!(
            "file not found under root: {} (name: {})",
            base.display(),
            name
        )));
    }

    matches.sort_by_key(|p| relative_lower(&base, p));

    if matches.len() == 1 {
        return sandboxed_file(ctx, &matches[0]);
    }

    sink.warn(&format!(
        "multiple files matched under root: {} (name: {})",
        base.display(),
        name
    ));
    let shown = matches.len().min(FILE_CANDIDATE_LIMIT);
    for (i, m) in matches.iter().take(shown).enumerate() {
        sink.warn(&format!("  {}) {}", i + 1, relative_display(&base, m)));
    }
    if matches.len() > shown {
        sink.warn(&format!("  ... ({} more)", matches.len() - shown));
    }

    if pick.is_none() {
        sink.warn("copy/paste one of:");
        for i in 0..shown {
            sink.warn(&format!(
                "  guard --file {} --pick {} {}",
                quote_if_needed(input),
                i + 1,
                rerun_flags
            ));
        }
        sink.warn("hint: rerun with --pick N (pick is required even with --force).");
    }

    let chosen = picked(&matches, pick)?;
    sandboxed_file(ctx, chosen)
}

/// Select by 1-based pick index, failing on absent or out-of-range values.
fn picked<'a>(candidates: &'a [PathBuf], pick: Option<usize>) -> Result<&'a PathBuf> {
    let idx = pick.ok_or_else(|| {
        Error::Resolve(format!(
            "multiple matches ({}); rerun with --pick <1..{}>",
            candidates.len(),
            candidates.len()
        ))
    })?;

    if idx < 1 || idx > candidates.len() {
        return Err(Error::Resolve(format!(
            "invalid --pick: {} (valid range: 1..{})",
            idx,
            candidates.len()
        )));
    }
    Ok(&candidates[idx - 1])
}

// ============================================================================
// Sandboxing
// ============================================================================

/// Canonicalize an existing directory and require it inside the workspace.
fn sandboxed_dir(ctx: &GuardContext, path: &Path) -> Result<PathBuf> {
    let canon = path.canonicalize().map_err(|_| {
        Error::Resolve(format!("root is not a directory: {}", path.display()))
    })?;
    if !canon.is_dir() {
        return Err(Error::Resolve(format!(
            "root is not a directory: {}",
            canon.display()
        )));
    }
    require_sandboxed(ctx, &canon)?;
    Ok(canon)
}

/// Canonicalize an existing regular file and require it inside the workspace.
fn sandboxed_file(ctx: &GuardContext, path: &Path) -> Result<PathBuf> {
    let canon = path.canonicalize().map_err(|_| {
        Error::Resolve(format!("not a regular file: {}", path.display()))
    })?;
    if !canon.is_file() {
        return Err(Error::Resolve(format!(
            "not a regular file: {}",
            canon.display()
        )));
    }
    require_sandboxed(ctx, &canon)?;
    Ok(canon)
}

/// The sandbox invariant: never clamp, never correct — fail.
fn require_sandboxed(ctx: &GuardContext, canon: &Path) -> Result<()> {
    if !canon.starts_with(&ctx.workspace_root) {
        return Err(Error::Resolve(format!(
            "invalid path (blocked path traversal): {}",
            canon.display()
        )));
    }
    Ok(())
}

// ============================================================================
// Tree searches
// ============================================================================

pub(crate) fn is_header(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(".h"))
        .unwrap_or(false)
}

pub(crate) fn is_package_info(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().eq_ignore_ascii_case("package-info.h"))
        .unwrap_or(false)
}

// Both searches walk real directories only; symlinks are never descended,
// so a link cannot pull candidates from outside the walked root.
fn collect_dirs_by_name(dir: &Path, name: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let path = entry.path();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().eq_ignore_ascii_case(name))
            .unwrap_or(false);
        if matches {
            out.push(path.clone());
        }
        collect_dirs_by_name(&path, name, out);
    }
}

fn collect_files_by_name(dir: &Path, name: &str, out: &mut Vec<PathBuf>) {
    if out.len() >= FILE_MATCH_CAP {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if out.len() >= FILE_MATCH_CAP {
            return;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            collect_files_by_name(&path, name, out);
        } else if file_type.is_file()
            && is_header(&path)
            && !is_package_info(&path)
            && path
                .file_name()
                .map(|n| n.to_string_lossy().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        {
            out.push(path);
        }
    }
}

// ============================================================================
// Display helpers
// ============================================================================

fn relative_display(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn relative_lower(base: &Path, path: &Path) -> String {
    relative_display(base, path).to_lowercase()
}

fn is_bare_file_name(input: &str) -> bool {
    !input.contains('/') && !input.contains('\\') && !input.contains(':')
}

fn quote_if_needed(s: &str) -> String {
    if s.contains(' ') || s.contains('\t') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}
