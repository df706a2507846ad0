//! Plan/apply orchestration across one file or a directory tree.
//!
//! Each pass is self-contained: it re-parses every file and owns its own
//! counters. The apply pass never reuses plan-pass state, so config or file
//! changes between the two passes cannot produce stale writes.

use super::action::GuardAction;
use super::parser::{self, GuardParse};
use super::resolve::{is_header, is_package_info};
use super::{mutate, LineSink};
use crate::error::Result;
use crate::utils::io::ReplaceOutcome;
use std::path::{Path, PathBuf};

/// Aggregate counters for one runner pass.
///
/// `scanned` counts every visited header; every file lands in exactly one of
/// the remaining buckets (or none, for no-ops where the computed name equals
/// the old one).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GuardSummary {
    pub scanned: u32,
    pub planned: u32,
    pub applied: u32,
    pub failed: u32,
    pub skipped_package_info: u32,
    pub skipped_no_guard: u32,
    pub skipped_no_uuid_suffix: u32,
    pub skipped_invalid: u32,
}

/// Terminal pipeline stage for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    SkippedPackageInfo,
    SkippedNoGuard,
    SkippedInvalid,
    SkippedNoUuidSuffix,
    /// Computed name equals the old name; nothing to plan or write.
    NoOp,
    Planned,
    Applied,
    /// Planned, but the mutation did not land.
    ApplyFailed,
    /// Could not even be read/parsed.
    Failed,
}

impl GuardSummary {
    fn fold(outcomes: impl IntoIterator<Item = FileOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(GuardSummary::default(), |mut acc, outcome| {
                acc.scanned += 1;
                match outcome {
                    FileOutcome::SkippedPackageInfo => acc.skipped_package_info += 1,
                    FileOutcome::SkippedNoGuard => acc.skipped_no_guard += 1,
                    FileOutcome::SkippedInvalid => acc.skipped_invalid += 1,
                    FileOutcome::SkippedNoUuidSuffix => acc.skipped_no_uuid_suffix += 1,
                    FileOutcome::NoOp => {}
                    FileOutcome::Planned => acc.planned += 1,
                    FileOutcome::Applied => {
                        acc.planned += 1;
                        acc.applied += 1;
                    }
                    FileOutcome::ApplyFailed => {
                        acc.planned += 1;
                        acc.failed += 1;
                    }
                    FileOutcome::Failed => acc.failed += 1,
                }
                acc
            })
    }
}

/// Run one pass over a single file.
pub fn run_single(
    file: &Path,
    action: &GuardAction,
    apply: bool,
    sink: &mut dyn LineSink,
) -> Result<GuardSummary> {
    let root = file.parent().unwrap_or(file);
    let outcome = run_one(file, root, action, apply, sink)?;
    Ok(GuardSummary::fold(std::iter::once(outcome)))
}

/// Run one pass over every `.h` file under `root`, in sorted relative-path
/// order. A failing file is counted and logged; the walk continues.
pub fn run_tree(
    root: &Path,
    action: &GuardAction,
    apply: bool,
    sink: &mut dyn LineSink,
) -> Result<GuardSummary> {
    let mut files = Vec::new();
    collect_headers(root, &mut files);
    files.sort();

    let outcomes: Vec<FileOutcome> = files
        .iter()
        .map(|file| {
            run_one(file, root, action, apply, sink).unwrap_or_else(|e| {
                sink.warn(&format!("[failed] {} : {}", rel(root, file), e));
                FileOutcome::Failed
            })
        })
        .collect();

    Ok(GuardSummary::fold(outcomes))
}

/// Per-file pipeline; every skip is terminal.
fn run_one(
    file: &Path,
    root: &Path,
    action: &GuardAction,
    apply: bool,
    sink: &mut dyn LineSink,
) -> Result<FileOutcome> {
    if is_package_info(file) {
        return Ok(FileOutcome::SkippedPackageInfo);
    }

    let old_guard = match parser::parse_file(file)? {
        GuardParse::NoGuard => return Ok(FileOutcome::SkippedNoGuard),
        GuardParse::Invalid(_) => return Ok(FileOutcome::SkippedInvalid),
        GuardParse::Ok(name) => name,
    };

    let Some(new_guard) = action.compute_new_guard(&old_guard) else {
        return Ok(FileOutcome::SkippedNoUuidSuffix);
    };

    if new_guard == old_guard {
        return Ok(FileOutcome::NoOp);
    }

    let display = rel(root, file);

    if !apply {
        sink.info(&format!("[plan] {}", display));
        sink.info(&format!(
            "  #ifndef {}  ->  #ifndef {}",
            old_guard, new_guard
        ));
        sink.info(&format!(
            "  #define {}  ->  #define {}",
            old_guard, new_guard
        ));
        return Ok(FileOutcome::Planned);
    }

    match mutate::apply_one(file, &old_guard, &new_guard) {
        Ok(Some(ReplaceOutcome::RenamedAtomically)) => {
            sink.info(&format!("[apply] {}", display));
            Ok(FileOutcome::Applied)
        }
        Ok(Some(ReplaceOutcome::RenamedNonAtomically)) => {
            // The content is complete; visibility is for readers racing the
            // copy-based replacement.
            sink.warn(&format!("[apply] {} (non-atomic replace)", display));
            Ok(FileOutcome::Applied)
        }
        Ok(None) => {
            sink.warn(&format!(
                "[apply failed] {} : guard pair no longer present (changed since plan?)",
                display
            ));
            Ok(FileOutcome::ApplyFailed)
        }
        Err(e) => {
            sink.warn(&format!("[apply failed] {} : {}", display, e));
            Ok(FileOutcome::ApplyFailed)
        }
    }
}

/// Walks real directories only. Symlinks are never descended or collected,
/// so a link cannot carry the pass outside the walked root or loop the walk.
fn collect_headers(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            collect_headers(&path, out);
        } else if file_type.is_file() && is_header(&path) {
            out.push(path);
        }
    }
}

fn rel(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::BufferSink;
    use std::fs;
    use tempfile::TempDir;

    const SUFFIX: &str = "1A2B3C4D_E5F6_7890_ABCD_EF1234567890";

    fn guarded(name: &str) -> String {
        format!("#ifndef {0}\n#define {0}\n\nint x;\n\n#endif // {0}\n", name)
    }

    fn tree() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("sub")).unwrap();

        fs::write(
            root.join("with_uuid.h"),
            guarded(&format!("OLD_{}", SUFFIX)),
        )
        .unwrap();
        fs::write(root.join("sub/plain.h"), guarded("PLAIN_GUARD_H")).unwrap();
        fs::write(root.join("no_guard.h"), "#pragma once\nint x;\n").unwrap();
        fs::write(
            root.join("bad.h"),
            "#ifndef A_H\n#define B_H\n#endif\n",
        )
        .unwrap();
        fs::write(root.join("package-info.h"), guarded("PKG_H")).unwrap();
        fs::write(root.join("readme.txt"), "not a header\n").unwrap();

        (dir, root)
    }

    #[test]
    fn plan_pass_counts_without_writing() {
        let (_dir, root) = tree();
        let action = GuardAction::new("NEW_", true, false);
        let mut sink = BufferSink::default();

        let summary = run_tree(&root, &action, false, &mut sink).unwrap();

        assert_eq!(summary.scanned, 5);
        assert_eq!(summary.planned, 1);
        assert_eq!(summary.applied, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped_package_info, 1);
        assert_eq!(summary.skipped_no_guard, 1);
        assert_eq!(summary.skipped_no_uuid_suffix, 1);
        assert_eq!(summary.skipped_invalid, 1);

        // No file content changed.
        let content = fs::read_to_string(root.join("with_uuid.h")).unwrap();
        assert!(content.contains(&format!("OLD_{}", SUFFIX)));

        // Two diff lines for the planned file.
        assert!(sink.lines.iter().any(|l| l.starts_with("[plan] ")));
        assert!(sink
            .lines
            .iter()
            .any(|l| l.contains("#ifndef OLD_") && l.contains("->  #ifndef NEW_")));
        assert!(sink
            .lines
            .iter()
            .any(|l| l.contains("#define OLD_") && l.contains("->  #define NEW_")));
    }

    #[test]
    fn apply_pass_rewrites_planned_files() {
        let (_dir, root) = tree();
        let action = GuardAction::new("NEW_", true, false);
        let mut sink = BufferSink::default();

        let summary = run_tree(&root, &action, true, &mut sink).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.failed, 0);

        let content = fs::read_to_string(root.join("with_uuid.h")).unwrap();
        assert!(content.contains(&format!("#ifndef NEW_{}", SUFFIX)));
        assert!(content.contains(&format!("#define NEW_{}", SUFFIX)));
        assert!(content.contains(&format!("#endif // NEW_{}", SUFFIX)));
        assert!(sink.lines.iter().any(|l| l.starts_with("[apply] ")));

        // Untouched files stay untouched.
        let plain = fs::read_to_string(root.join("sub/plain.h")).unwrap();
        assert!(plain.contains("PLAIN_GUARD_H"));
    }

    #[test]
    fn refresh_apply_is_idempotent() {
        let (_dir, root) = tree();
        let action = GuardAction::new("NEW_", true, false);

        let mut sink = BufferSink::default();
        let first = run_tree(&root, &action, true, &mut sink).unwrap();
        assert_eq!(first.applied, 1);

        let mut sink = BufferSink::default();
        let second = run_tree(&root, &action, true, &mut sink).unwrap();
        assert_eq!(second.planned, 0);
        assert_eq!(second.applied, 0);
        assert_eq!(second.scanned, first.scanned);
    }

    #[test]
    fn tree_with_no_recognizable_guards_reports_success_shape() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.h"), "#pragma once\n").unwrap();
        fs::write(dir.path().join("b.h"), "#pragma once\n").unwrap();
        let action = GuardAction::new("NEW_", true, false);
        let mut sink = BufferSink::default();

        let summary = run_tree(dir.path(), &action, false, &mut sink).unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.planned, 0);
        assert_eq!(summary.skipped_no_guard, 2);
    }

    #[test]
    fn run_single_processes_exactly_one_file() {
        let (_dir, root) = tree();
        let action = GuardAction::new("NEW_", false, true);
        let mut sink = BufferSink::default();

        let summary =
            run_single(&root.join("sub/plain.h"), &action, false, &mut sink).unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.planned, 1);
    }

    #[test]
    fn regen_plans_files_without_uuid_suffix_too() {
        let (_dir, root) = tree();
        let action = GuardAction::new("NEW_", false, true);
        let mut sink = BufferSink::default();

        let summary = run_tree(&root, &action, false, &mut sink).unwrap();
        // Both the uuid-suffixed and the plain guard get a fresh suffix.
        assert_eq!(summary.planned, 2);
        assert_eq!(summary.skipped_no_uuid_suffix, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_not_descended() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(
            outside.path().join("escape.h"),
            guarded(&format!("OLD_{}", SUFFIX)),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("inside.h"),
            guarded(&format!("OLD_{}", SUFFIX)),
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linked")).unwrap();
        // A self-link must not loop the walk either.
        std::os::unix::fs::symlink(root, root.join("cycle")).unwrap();

        let action = GuardAction::new("NEW_", true, false);
        let mut sink = BufferSink::default();
        let summary = run_tree(root, &action, true, &mut sink).unwrap();

        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.applied, 1);

        let inside = fs::read_to_string(root.join("inside.h")).unwrap();
        assert!(inside.contains(&format!("NEW_{}", SUFFIX)));
        let escaped = fs::read_to_string(outside.path().join("escape.h")).unwrap();
        assert!(escaped.contains(&format!("OLD_{}", SUFFIX)));
    }

    #[test]
    fn unreadable_file_is_isolated_not_fatal() {
        let (_dir, root) = tree();
        // Invalid UTF-8 makes the parse read fail for this one file.
        fs::write(root.join("binary.h"), [0xFF, 0xFE, 0x00, 0x9F]).unwrap();
        let action = GuardAction::new("NEW_", true, false);
        let mut sink = BufferSink::default();

        let summary = run_tree(&root, &action, false, &mut sink).unwrap();
        assert_eq!(summary.scanned, 6);
        assert_eq!(summary.failed, 1);
        // The good file is still planned.
        assert_eq!(summary.planned, 1);
        assert!(sink.lines.iter().any(|l| l.starts_with("[failed] ")));
    }
}
