//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Drives language servers from a terminal.
#[derive(Parser, Debug)]
#[command(
    name = "tether",
    disable_help_subcommand = true,
    after_help = "Configuration flags such as --config-path, --log-filter and --log-format \
                  go before the subcommand. Settings may also come from a TOML file or \
                  TETHER_* environment variables."
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Structured subcommands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Requests completions at a position and prints them as JSON lines.
    Complete {
        /// Document to complete in.
        file: PathBuf,
        /// Zero-based line.
        #[arg(long)]
        line: u32,
        /// Zero-based byte column.
        #[arg(long)]
        character: u32,
        /// Workspace root; defaults to the file's directory.
        #[arg(long, value_name = "DIR")]
        workspace: Option<PathBuf>,
    },
    /// Starts the server for a file's language and runs the handshake.
    Probe {
        /// Document whose language selects the server.
        file: PathBuf,
        /// Workspace root; defaults to the file's directory.
        #[arg(long, value_name = "DIR")]
        workspace: Option<PathBuf>,
    },
}
