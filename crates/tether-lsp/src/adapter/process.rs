//! Process-based language server adapter.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use super::config::ServerCommand;
use super::error::AdapterError;
use super::inbox::FrameInbox;
use super::lifecycle::ADAPTER_TARGET;
use super::profile::{ServerProfile, default_profile};
use super::state::{AdapterState, AdapterStatus};
use super::supervisor::ServerProcess;
use crate::Language;
use crate::config::{ClientConfig, PollBudget};

/// Budgets and limits a process adapter applies to its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSettings {
    /// Wait for the `initialize` result.
    pub handshake: PollBudget,
    /// Frames buffered before the oldest unread one is dropped.
    pub inbox_capacity: usize,
    /// Wait between `exit` and force-kill.
    pub shutdown_grace: Duration,
}

impl From<&ClientConfig> for AdapterSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            handshake: config.handshake,
            inbox_capacity: config.inbox_capacity,
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// A language server adapter that spawns and talks to an external process.
///
/// The variant-specific parts (executable, arguments, language ids) come
/// from a [`ServerProfile`]; spawning, the handshake, and teardown are
/// shared through [`ServerProcess`].
pub struct ProcessAdapter {
    profile: Box<dyn ServerProfile>,
    command: ServerCommand,
    settings: AdapterSettings,
    state: AdapterState,
}

impl ProcessAdapter {
    /// Creates an adapter from a profile, applying any configured override.
    #[must_use]
    pub fn new(profile: Box<dyn ServerProfile>, config: &ClientConfig) -> Self {
        let command = profile
            .default_command()
            .overridden_by(config.server_override(profile.language()));
        Self {
            profile,
            command,
            settings: AdapterSettings::from(config),
            state: AdapterState::Uninitialized,
        }
    }

    /// Creates the built-in adapter for a language.
    #[must_use]
    pub fn for_language(language: Language, config: &ClientConfig) -> Self {
        Self::new(default_profile(language), config)
    }

    /// Command used to launch the server.
    #[must_use]
    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> AdapterStatus {
        self.state.status()
    }

    /// Process id of the running server.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            AdapterState::Ready(process) => Some(process.pid()),
            _ => None,
        }
    }

    pub(super) fn language_of_profile(&self) -> Language {
        self.profile.language()
    }

    pub(super) fn profile(&self) -> &dyn ServerProfile {
        self.profile.as_ref()
    }

    pub(super) fn running(&self) -> Option<&ServerProcess> {
        match &self.state {
            AdapterState::Ready(process) if !process.inbox().is_closed() => Some(process),
            _ => None,
        }
    }

    pub(super) fn running_mut(&mut self) -> Option<&mut ServerProcess> {
        match &mut self.state {
            AdapterState::Ready(process) if !process.inbox().is_closed() => Some(process),
            _ => None,
        }
    }

    pub(super) fn inbox(&self) -> Option<FrameInbox> {
        self.running().map(|process| process.inbox().clone())
    }

    /// Spawns the server and runs the handshake, leaving the adapter Ready
    /// or Failed.
    pub(super) fn start(&mut self, workspace: &Path) -> Result<(), AdapterError> {
        if self.running().is_some() {
            return Ok(());
        }
        // A Ready state whose output has closed means the server died.
        self.stop();

        let language = self.language_of_profile();
        self.state = AdapterState::Initializing;
        let outcome = ServerProcess::spawn(&self.command, language, self.settings.inbox_capacity)
            .and_then(|mut process| {
                match process.handshake(Some(workspace), self.settings.handshake) {
                    Ok(()) => Ok(process),
                    Err(error) => {
                        process.shutdown(self.settings.shutdown_grace);
                        Err(error)
                    }
                }
            });

        match outcome {
            Ok(process) => {
                debug!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    pid = process.pid(),
                    "language server ready"
                );
                self.state = AdapterState::Ready(process);
                Ok(())
            }
            Err(error) => {
                warn!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    error = %error,
                    "language server failed to start"
                );
                self.state = AdapterState::Failed {
                    reason: error.to_string(),
                };
                Err(error)
            }
        }
    }

    /// Shuts down a running server and returns to Uninitialized.
    pub(super) fn stop(&mut self) {
        if let AdapterState::Ready(process) = std::mem::take(&mut self.state) {
            process.shutdown(self.settings.shutdown_grace);
        }
    }
}

impl Drop for ProcessAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for ProcessAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessAdapter")
            .field("language", &self.profile.language())
            .field("command", &self.command.command)
            .field("state", &self.state.status())
            .field("pid", &self.pid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;
    use crate::config::ServerOverride;

    #[rstest]
    fn configured_override_replaces_builtin_command() {
        let mut config = ClientConfig::default();
        config.servers.insert(
            Language::Go,
            ServerOverride {
                command: Some(PathBuf::from("/usr/local/bin/gopls")),
                args: Some(vec![String::from("-remote=auto")]),
                working_dir: None,
            },
        );

        let adapter = ProcessAdapter::for_language(Language::Go, &config);

        assert_eq!(adapter.command().command, PathBuf::from("/usr/local/bin/gopls"));
        assert_eq!(adapter.command().args, vec!["-remote=auto"]);
        assert_eq!(adapter.status(), AdapterStatus::Uninitialized);
    }

    #[rstest]
    fn missing_binary_leaves_adapter_failed_and_retryable() {
        let mut config = ClientConfig::default();
        config.servers.insert(
            Language::Cpp,
            ServerOverride {
                command: Some(PathBuf::from("/nonexistent/clangd")),
                ..ServerOverride::default()
            },
        );
        let mut adapter = ProcessAdapter::for_language(Language::Cpp, &config);

        let first = adapter.start(Path::new("/tmp"));
        let second = adapter.start(Path::new("/tmp"));

        assert!(matches!(first, Err(AdapterError::BinaryNotFound { .. })));
        assert!(matches!(second, Err(AdapterError::BinaryNotFound { .. })));
        assert_eq!(adapter.status(), AdapterStatus::Failed);
        assert!(adapter.pid().is_none());
    }
}
