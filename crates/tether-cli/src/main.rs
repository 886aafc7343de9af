//! CLI entrypoint for probing language servers.
//!
//! The binary delegates to [`tether_cli::run`], which parses arguments,
//! loads configuration, and drives the client library.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: worker threads log to stderr while a command runs.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    tether_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
