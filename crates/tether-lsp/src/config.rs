//! Client configuration: server launch overrides, polling budgets, limits.
//!
//! Every field has a default so a partial document deserialises into a
//! working configuration. Embedders build the value however they like; the
//! `tether` binary layers it from files, environment and flags.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::logging::LogSettings;

/// Number of read attempts and the wait applied to each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollBudget {
    /// Maximum number of frames to inspect before giving up.
    pub attempts: u32,
    /// Wait per attempt, in milliseconds.
    pub interval_ms: u64,
}

impl PollBudget {
    /// Builds a budget from an attempt count and per-attempt interval.
    #[must_use]
    pub const fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval_ms,
        }
    }

    /// Per-attempt wait as a [`Duration`].
    #[must_use]
    pub const fn interval(self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on the total wait.
    #[must_use]
    pub fn total(self) -> Duration {
        self.interval().saturating_mul(self.attempts)
    }
}

/// Replaces the built-in executable or launch flags of one adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerOverride {
    /// Executable path or command name.
    pub command: Option<PathBuf>,
    /// Launch arguments; replaces the built-in arguments entirely.
    pub args: Option<Vec<String>>,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
}

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-language launch overrides.
    pub servers: HashMap<Language, ServerOverride>,
    /// Budget for the `initialize` result during the handshake.
    pub handshake: PollBudget,
    /// Budget for a correlated completion response.
    pub completion: PollBudget,
    /// Window within which an identical `didChange` is suppressed.
    pub debounce_ms: u64,
    /// Maximum number of completion items kept after ranking.
    pub max_completions: usize,
    /// Grace period between `exit` and force-kill during shutdown.
    pub shutdown_grace_ms: u64,
    /// Frames buffered per adapter before the oldest unread one is dropped.
    pub inbox_capacity: usize,
    /// Log filter and format.
    pub logging: LogSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            servers: HashMap::new(),
            handshake: PollBudget::new(40, 250),
            completion: PollBudget::new(15, 50),
            debounce_ms: 50,
            max_completions: 25,
            shutdown_grace_ms: 200,
            inbox_capacity: 256,
            logging: LogSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Launch override for a language, if one is configured.
    #[must_use]
    pub fn server_override(&self, language: Language) -> Option<&ServerOverride> {
        self.servers.get(&language)
    }

    /// `didChange` debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Grace period before a server that ignored `exit` is killed.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
