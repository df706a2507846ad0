//! Structural include-guard recognition.
//!
//! A guard is only accepted when a lone `#ifndef NAME` is followed by a lone
//! `#define NAME` with the same macro name, in that order, within the first
//! 200 lines. Anything looser (a `#define` with a value, reversed order, a
//! name mismatch) is not a guard and must never be rewritten.

use crate::error::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Lines scanned before giving up on finding the guard pair.
const SCAN_LIMIT: usize = 200;

fn ifndef_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*#ifndef\s+([A-Za-z_][A-Za-z0-9_]*)\s*$").expect("ifndef pattern")
    })
}

fn define_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*#define\s+([A-Za-z_][A-Za-z0-9_]*)\s*$").expect("define pattern")
    })
}

/// Classification of a header's include guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardParse {
    /// Well-formed guard; the `#ifndef` and `#define` names are equal.
    Ok(String),
    NoGuard,
    Invalid(String),
}

/// Parse the guard of the file at `path`.
pub fn parse_file(path: &Path) -> Result<GuardParse> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse(&content))
}

/// Classify the guard of already-read header content.
///
/// Two-state scan: seek `#ifndef`, then seek `#define`. The ordering and the
/// name-equality check are what distinguish a real guard from incidental
/// directives.
pub fn parse(content: &str) -> GuardParse {
    let mut ifndef: Option<&str> = None;
    let mut define: Option<&str> = None;

    for line in content.lines().take(SCAN_LIMIT) {
        if ifndef.is_none() {
            if let Some(caps) = ifndef_re().captures(line) {
                ifndef = caps.get(1).map(|m| m.as_str());
                continue;
            }
        }

        if ifndef.is_some() && define.is_none() {
            if let Some(caps) = define_re().captures(line) {
                define = caps.get(1).map(|m| m.as_str());
                break;
            }
        }
    }

    match (ifndef, define) {
        (None, None) => GuardParse::NoGuard,
        (Some(_), None) | (None, Some(_)) => {
            GuardParse::Invalid("incomplete guard (missing ifndef/define)".to_string())
        }
        (Some(i), Some(d)) if i != d => {
            GuardParse::Invalid(format!("ifndef != define ({} vs {})", i, d))
        }
        (Some(i), Some(_)) => GuardParse::Ok(i.to_string()),
    }
}
