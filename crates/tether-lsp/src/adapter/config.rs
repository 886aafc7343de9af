//! Launch commands for language server processes.

use std::path::PathBuf;

use crate::config::ServerOverride;

/// Executable, arguments, and working directory used to spawn one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    /// The executable path or command name.
    pub command: PathBuf,
    /// Arguments to pass to the language server.
    pub args: Vec<String>,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
}

impl ServerCommand {
    /// Builds a command with no working directory.
    #[must_use]
    pub fn new<I, S>(command: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    /// Sets a custom working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Applies a configured override; absent override fields keep the
    /// current values.
    #[must_use]
    pub fn overridden_by(mut self, overrides: Option<&ServerOverride>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };
        if let Some(command) = &overrides.command {
            self.command.clone_from(command);
        }
        if let Some(args) = &overrides.args {
            self.args.clone_from(args);
        }
        if let Some(dir) = &overrides.working_dir {
            self.working_dir = Some(dir.clone());
        }
        self
    }
}
