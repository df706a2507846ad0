//! Crash-safe rewrite of the guard-bearing lines of one header.

use crate::error::Result;
use crate::utils::io::{self, ReplaceOutcome};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Lines searched for the `#ifndef`/`#define` pair.
const PAIR_LIMIT: usize = 300;
/// Lines searched for the `#endif` trailer comment.
const ENDIF_LIMIT: usize = 1200;

fn ifndef_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*#ifndef\s+)([A-Za-z_][A-Za-z0-9_]*)(\s*)$").expect("ifndef line pattern")
    })
}

fn define_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*#define\s+)([A-Za-z_][A-Za-z0-9_]*)(\s*)$").expect("define line pattern")
    })
}

/// Rewrite the guard lines matching `old_guard` from `old_guard` to
/// `new_guard`.
///
/// Re-reads the file and re-locates the pair for `old_guard` specifically;
/// if the file changed since the plan pass and the pair is gone, returns
/// `Ok(None)` so the runner can count it as a per-file failure without
/// aborting the batch. A successful write reports how the replacement
/// landed on disk. Every other line is preserved byte-for-byte, including
/// the file's line-ending convention.
pub fn apply_one(
    file: &Path,
    old_guard: &str,
    new_guard: &str,
) -> Result<Option<ReplaceOutcome>> {
    let text = io::read_file(file)?;

    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();

    let mut ifndef_idx = None;
    let mut define_idx = None;

    for (i, line) in lines.iter().take(PAIR_LIMIT).enumerate() {
        if ifndef_idx.is_none() {
            if let Some(caps) = ifndef_line_re().captures(line) {
                if &caps[2] == old_guard {
                    ifndef_idx = Some(i);
                    continue;
                }
            }
        }

        if ifndef_idx.is_some() && define_idx.is_none() {
            if let Some(caps) = define_line_re().captures(line) {
                if &caps[2] == old_guard {
                    define_idx = Some(i);
                    break;
                }
            }
        }
    }

    let (Some(ifndef_idx), Some(define_idx)) = (ifndef_idx, define_idx) else {
        return Ok(None);
    };

    let new_ifndef = replace_directive_macro(&lines[ifndef_idx], ifndef_line_re(), new_guard);
    lines[ifndef_idx] = new_ifndef;
    let new_define = replace_directive_macro(&lines[define_idx], define_line_re(), new_guard);
    lines[define_idx] = new_define;

    // First trailing #endif that still names the old guard, e.g.
    // `#endif // OLD_GUARD`. Only that one occurrence is replaced.
    let endif_end = lines.len().min(ENDIF_LIMIT);
    for i in define_idx..endif_end {
        if lines[i].contains("#endif") && lines[i].contains(old_guard) {
            let rewritten = lines[i].replacen(old_guard, new_guard, 1);
            lines[i] = rewritten;
            break;
        }
    }

    let outcome = io::write_file_atomic(file, &lines.join(eol))?;
    Ok(Some(outcome))
}

fn replace_directive_macro(line: &str, re: &Regex, new_guard: &str) -> String {
    match re.captures(line) {
        Some(caps) => format!("{}{}{}", &caps[1], new_guard, &caps[3]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn header(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn rewrites_only_the_guard_lines() {
        let dir = tempfile::tempdir().unwrap();
        let content = "// banner\n#ifndef OLD_G\n#define OLD_G\n\nint x = 1;\n\n#endif // OLD_G\n";
        let path = header(&dir, "a.h", content);

        assert_eq!(
            apply_one(&path, "OLD_G", "NEW_G").unwrap(),
            Some(ReplaceOutcome::RenamedAtomically)
        );

        let after = fs::read_to_string(&path).unwrap();
        assert_eq!(
            after,
            "// banner\n#ifndef NEW_G\n#define NEW_G\n\nint x = 1;\n\n#endif // NEW_G\n"
        );
    }

    #[test]
    fn non_guard_lines_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let content = "#ifndef OLD_G\n#define OLD_G\n\tint  weird   spacing;\n#endif\n";
        let path = header(&dir, "a.h", content);

        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_some());

        let before: Vec<&str> = content.lines().collect();
        let after_text = fs::read_to_string(&path).unwrap();
        let after: Vec<&str> = after_text.lines().collect();
        assert_eq!(before.len(), after.len());
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]); // bare #endif untouched
    }

    #[test]
    fn preserves_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let content = "#ifndef OLD_G\r\n#define OLD_G\r\nint x;\r\n#endif // OLD_G\r\n";
        let path = header(&dir, "a.h", content);

        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_some());

        let after = fs::read_to_string(&path).unwrap();
        assert!(after.contains("#ifndef NEW_G\r\n"));
        assert!(after.contains("#endif // NEW_G\r\n"));
        assert!(!after.contains("\n\n")); // no LF-only lines crept in
    }

    #[test]
    fn reports_nothing_written_when_guard_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let content = "#ifndef OTHER_G\n#define OTHER_G\n#endif\n";
        let path = header(&dir, "a.h", content);

        // Old guard from the plan pass is no longer in the file.
        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn matches_the_named_guard_not_the_first_pair() {
        let dir = tempfile::tempdir().unwrap();
        // A conditional block precedes the real guard pair.
        let content = "#ifndef FEATURE_X\n#define FEATURE_X_SHIM\n#endif\n\
                       #ifndef OLD_G\n#define OLD_G\n#endif // OLD_G\n";
        let path = header(&dir, "a.h", content);

        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_some());

        let after = fs::read_to_string(&path).unwrap();
        assert!(after.contains("#ifndef FEATURE_X\n"));
        assert!(after.contains("#define FEATURE_X_SHIM\n"));
        assert!(after.contains("#ifndef NEW_G\n#define NEW_G\n#endif // NEW_G\n"));
    }

    #[test]
    fn endif_replacement_touches_only_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let content = "#ifndef OLD_G\n#define OLD_G\n#endif // OLD_G OLD_G\n";
        let path = header(&dir, "a.h", content);

        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_some());

        let after = fs::read_to_string(&path).unwrap();
        assert!(after.contains("#endif // NEW_G OLD_G\n"));
    }

    #[test]
    fn guard_with_trailing_whitespace_is_still_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let content = "#ifndef OLD_G   \n#define OLD_G\n#endif\n";
        let path = header(&dir, "a.h", content);

        assert!(apply_one(&path, "OLD_G", "NEW_G").unwrap().is_some());
        let after = fs::read_to_string(&path).unwrap();
        assert!(after.contains("#ifndef NEW_G   \n"));
    }
}
