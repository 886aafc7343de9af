//! Layered configuration for the `tether` binary.
//!
//! `ortho_config` merges built-in defaults, a TOML file (`--config-path` or
//! `TETHER_CONFIG_PATH`), `TETHER_*` environment variables and command-line
//! flags, in that order of increasing precedence. Only flags listed in
//! [`CONFIG_CLI_FLAGS`] that appear before the subcommand reach the loader;
//! everything from the first other token onwards belongs to the subcommand.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use tether_lsp::{
    ClientConfig, DEFAULT_LOG_FILTER, Language, LogFormat, LogSettings, PollBudget,
    ServerOverride,
};

use crate::errors::AppError;

/// CLI flags recognised by the configuration loader.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--handshake-attempts",
    "--handshake-interval-ms",
    "--completion-attempts",
    "--completion-interval-ms",
    "--debounce-ms",
    "--max-completions",
    "--shutdown-grace-ms",
    "--cpp-command",
    "--python-command",
    "--typescript-command",
    "--go-command",
    "--luau-command",
];

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Settings for one `tether` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TETHER")]
pub struct TetherConfig {
    /// Log filter expression, for example `tether_lsp=debug`.
    #[ortho_config(default = default_log_filter())]
    pub log_filter: String,
    /// Log output format (`json` or `compact`).
    #[ortho_config(default = LogFormat::Compact)]
    pub log_format: LogFormat,
    /// Frames inspected while waiting for the `initialize` result.
    #[ortho_config(default = 40)]
    pub handshake_attempts: u32,
    /// Wait per handshake attempt, in milliseconds.
    #[ortho_config(default = 250)]
    pub handshake_interval_ms: u64,
    /// Frames inspected while waiting for a completion response.
    #[ortho_config(default = 15)]
    pub completion_attempts: u32,
    /// Wait per completion attempt, in milliseconds.
    #[ortho_config(default = 50)]
    pub completion_interval_ms: u64,
    /// Window within which an identical `didChange` is suppressed.
    #[ortho_config(default = 50)]
    pub debounce_ms: u64,
    /// Maximum number of completion items printed.
    #[ortho_config(default = 25)]
    pub max_completions: usize,
    /// Grace period between `exit` and force-kill, in milliseconds.
    #[ortho_config(default = 200)]
    pub shutdown_grace_ms: u64,
    /// Replacement for `clangd`.
    pub cpp_command: Option<PathBuf>,
    /// Replacement for `pyright-langserver`.
    pub python_command: Option<PathBuf>,
    /// Replacement for `typescript-language-server`.
    pub typescript_command: Option<PathBuf>,
    /// Replacement for `gopls`.
    pub go_command: Option<PathBuf>,
    /// Replacement for `luau-lsp`.
    pub luau_command: Option<PathBuf>,
}

impl TetherConfig {
    /// Library configuration built from the merged layers.
    pub(crate) fn client_config(&self) -> ClientConfig {
        let servers = self
            .command_overrides()
            .map(|(language, command)| {
                let launch = ServerOverride {
                    command: Some(command.clone()),
                    ..ServerOverride::default()
                };
                (language, launch)
            })
            .collect();
        ClientConfig {
            servers,
            handshake: PollBudget::new(self.handshake_attempts, self.handshake_interval_ms),
            completion: PollBudget::new(self.completion_attempts, self.completion_interval_ms),
            debounce_ms: self.debounce_ms,
            max_completions: self.max_completions,
            shutdown_grace_ms: self.shutdown_grace_ms,
            logging: LogSettings {
                filter: self.log_filter.clone(),
                format: self.log_format,
            },
            ..ClientConfig::default()
        }
    }

    fn command_overrides(&self) -> impl Iterator<Item = (Language, &PathBuf)> {
        [
            (Language::Cpp, &self.cpp_command),
            (Language::Python, &self.python_command),
            (Language::TypeScript, &self.typescript_command),
            (Language::Go, &self.go_command),
            (Language::Luau, &self.luau_command),
        ]
        .into_iter()
        .filter_map(|(language, command)| command.as_ref().map(|path| (language, path)))
    }
}

pub(crate) trait ConfigLoader {
    /// Loads configuration from the program name plus the leading
    /// configuration flags produced by [`split_config_arguments`].
    fn load(&self, args: &[OsString]) -> Result<TetherConfig, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<TetherConfig, AppError> {
        TetherConfig::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if flag.starts_with("--") && CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments for the configuration loader and for the subcommand parser.
///
/// Both vectors start with the program name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };
    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    while let Some(argument) = remaining.as_slice().first() {
        let FlagAction::Include { needs_value } = classify_flag(argument) else {
            break;
        };
        config_arguments.extend(remaining.next().cloned());
        if needs_value {
            config_arguments.extend(remaining.next().cloned());
        }
    }
    let command_arguments = std::iter::once(program.clone())
        .chain(remaining.cloned())
        .collect();
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
