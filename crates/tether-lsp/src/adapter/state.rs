//! Lifecycle state of a process adapter.

use std::fmt;

use super::supervisor::ServerProcess;

/// Internal state of the language server process.
#[derive(Debug, Default)]
pub enum AdapterState {
    /// No process has been started.
    #[default]
    Uninitialized,
    /// The process is running and the handshake is in progress.
    Initializing,
    /// The handshake completed; the server accepts requests.
    Ready(ServerProcess),
    /// The last spawn or handshake failed; initialization may be retried.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

impl AdapterState {
    /// Data-free summary of the state.
    #[must_use]
    pub fn status(&self) -> AdapterStatus {
        match self {
            Self::Uninitialized => AdapterStatus::Uninitialized,
            Self::Initializing => AdapterStatus::Initializing,
            Self::Ready(_) => AdapterStatus::Ready,
            Self::Failed { .. } => AdapterStatus::Failed,
        }
    }
}

/// Copyable view of [`AdapterState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    /// Not started.
    Uninitialized,
    /// Handshake in progress.
    Initializing,
    /// Accepting requests.
    Ready,
    /// Spawn or handshake failed.
    Failed,
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        formatter.write_str(label)
    }
}
