//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and the confirmation gate used before apply passes.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

/// Print a status line to stderr regardless of TTY state.
///
/// Guard summaries and per-file diffs must stay visible when stderr is piped,
/// so this intentionally skips the `log_status!` terminal gate.
pub fn line(message: &str) {
    eprintln!("{}", message);
}

/// Interactive yes/no checkpoint before an apply pass.
///
/// Fails closed: no interactive stdin, end-of-input, a read error, or any
/// answer other than `y`/`yes` all decline.
pub fn confirm_apply(planned: u32) -> bool {
    if !is_stdin_tty() {
        line("[confirm] no interactive terminal; cancelling apply.");
        return false;
    }

    line("");
    line(&format!("[confirm] about to modify {} file(s).", planned));
    eprint!("[confirm] continue? (y/N): ");
    io::stderr().flush().ok();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => return false, // EOF or read failure
        Ok(_) => {}
    }

    accepted(&answer)
}

fn accepted(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
