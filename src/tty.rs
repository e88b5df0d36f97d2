//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and user prompting.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn prompt(message: &str) -> xlrelease::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| xlrelease::Error::internal_io(e.to_string(), Some("read input".to_string())))?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Reads a password from stdin, prompting first when stdin is a terminal.
pub fn prompt_password(message: &str) -> xlrelease::Result<String> {
    if is_stdin_tty() {
        prompt(message)
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map_err(|e| {
            xlrelease::Error::internal_io(e.to_string(), Some("read password".to_string()))
        })?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message);
    }
}

// log_status! macro is defined in lib.rs (#[macro_export]) and available crate-wide.
