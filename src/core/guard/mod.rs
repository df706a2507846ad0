//! Include-guard migration engine.
//!
//! Plans and (on confirmation) applies rewrites of `#ifndef`/`#define`
//! include-guard macro names across a header tree:
//! 1. `resolve` turns a target spec into one sandboxed file or directory
//! 2. `runner` walks the target in plan mode, counting and printing diffs
//! 3. after confirmation, an independent apply pass re-parses and rewrites
//!    each file crash-safely
//!
//! Per-file failures never abort a batch; each pass owns its own counters.

pub mod action;
pub mod mutate;
pub mod parser;
pub mod resolve;
pub mod runner;

pub use action::GuardAction;
pub use parser::GuardParse;
pub use resolve::{resolve, ResolvedTarget};
pub use runner::{run_single, run_tree, GuardSummary};

use std::path::PathBuf;

/// What the invocation targets. Exactly one variant per invocation; the
/// CLI's arg group enforces that before anything touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single header, by bare name or path, optionally disambiguated.
    File { input: String, pick: Option<usize> },
    /// The whole configured base tree.
    All,
    /// A directory given by path (absolute or workspace-relative).
    Dir(PathBuf),
    /// A directory found by basename search, optionally disambiguated.
    DirName { name: String, pick: Option<usize> },
}

/// Line-oriented output sink for runner/resolver progress and warnings.
///
/// The CLI wires this to stderr; tests capture lines in a buffer.
pub trait LineSink {
    fn info(&mut self, line: &str);
    fn warn(&mut self, line: &str);
}

/// Sink that collects lines, for tests and quiet callers.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl LineSink for BufferSink {
    fn info(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn warn(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
