//! Per-language server variants.
//!
//! A profile only knows where its server lives, how to launch it, and which
//! LSP language id to report for a document. Framing, the handshake, and
//! teardown are shared by [`ProcessAdapter`](super::ProcessAdapter).

use std::env;
use std::path::{Path, PathBuf};

use super::config::ServerCommand;
use crate::Language;

/// Launch details and language-id mapping for one kind of server.
pub trait ServerProfile: Send + Sync {
    /// Language served.
    fn language(&self) -> Language;

    /// Command used when no override is configured.
    fn default_command(&self) -> ServerCommand;

    /// LSP `languageId` for a document handled by this server.
    fn language_id(&self, path: &Path) -> &'static str;
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|extension| extension.to_str())
}

/// C and C++ through `clangd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clangd;

impl ServerProfile for Clangd {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn default_command(&self) -> ServerCommand {
        ServerCommand::new("clangd", Vec::<String>::new())
    }

    fn language_id(&self, path: &Path) -> &'static str {
        match extension(path) {
            Some("c") => "c",
            _ => "cpp",
        }
    }
}

/// Python through `pyright-langserver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pyright;

impl ServerProfile for Pyright {
    fn language(&self) -> Language {
        Language::Python
    }

    fn default_command(&self) -> ServerCommand {
        ServerCommand::new("pyright-langserver", ["--stdio"])
    }

    fn language_id(&self, _path: &Path) -> &'static str {
        "python"
    }
}

/// TypeScript and JavaScript through `typescript-language-server`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptServer;

impl ServerProfile for TypeScriptServer {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn default_command(&self) -> ServerCommand {
        ServerCommand::new("typescript-language-server", ["--stdio"])
    }

    fn language_id(&self, path: &Path) -> &'static str {
        match extension(path) {
            Some("tsx") => "typescriptreact",
            Some("js") => "javascript",
            Some("jsx") => "javascriptreact",
            _ => "typescript",
        }
    }
}

/// Go through `gopls`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gopls;

impl ServerProfile for Gopls {
    fn language(&self) -> Language {
        Language::Go
    }

    fn default_command(&self) -> ServerCommand {
        ServerCommand::new("gopls", Vec::<String>::new())
    }

    fn language_id(&self, _path: &Path) -> &'static str {
        "go"
    }
}

/// Platform directory of the bundled Luau server.
#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
const PLATFORM_DIR: &str = "win-x64";
#[cfg(all(target_os = "macos", target_arch = "aarch64"))]
const PLATFORM_DIR: &str = "macos-arm64";
#[cfg(all(target_os = "macos", not(target_arch = "aarch64")))]
const PLATFORM_DIR: &str = "macos-x64";
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
const PLATFORM_DIR: &str = "linux-arm64";
#[cfg(not(any(
    all(target_os = "windows", target_arch = "x86_64"),
    target_os = "macos",
    all(target_os = "linux", target_arch = "aarch64")
)))]
const PLATFORM_DIR: &str = "linux-x64";

const LUAU_ARGS: [&str; 4] = [
    "lsp",
    "--docs=./luau-config/en-us.json",
    "--definitions=./luau-config/globalTypes.d.lua",
    "--base-luaurc=./luau-config/.luaurc",
];

/// Luau and Lua through `luau-lsp`, preferring the copy bundled with the
/// application.
#[derive(Debug, Clone, Default)]
pub struct LuauLsp {
    install_dir: Option<PathBuf>,
}

impl LuauLsp {
    /// Looks for the bundled server next to the running executable.
    #[must_use]
    pub fn new() -> Self {
        let install_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self { install_dir }
    }

    /// Looks for the bundled server under `install_dir`.
    #[must_use]
    pub fn with_install_dir(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: Some(install_dir.into()),
        }
    }

    /// Location of the bundled server binary, whether or not it exists.
    #[must_use]
    pub fn bundled_path(&self) -> Option<PathBuf> {
        let binary = if cfg!(windows) {
            "luau-lsp.exe"
        } else {
            "luau-lsp"
        };
        self.install_dir.as_ref().map(|dir| {
            dir.join("servers")
                .join("luau-lsp")
                .join("current")
                .join(PLATFORM_DIR)
                .join(binary)
        })
    }
}

impl ServerProfile for LuauLsp {
    fn language(&self) -> Language {
        Language::Luau
    }

    fn default_command(&self) -> ServerCommand {
        let command = self
            .bundled_path()
            .filter(|path| path.is_file())
            .unwrap_or_else(|| PathBuf::from("luau-lsp"));
        ServerCommand::new(command, LUAU_ARGS)
    }

    fn language_id(&self, _path: &Path) -> &'static str {
        "luau"
    }
}

/// Built-in profile for a language.
#[must_use]
pub fn default_profile(language: Language) -> Box<dyn ServerProfile> {
    match language {
        Language::Cpp => Box::new(Clangd),
        Language::Python => Box::new(Pyright),
        Language::TypeScript => Box::new(TypeScriptServer),
        Language::Go => Box::new(Gopls),
        Language::Luau => Box::new(LuauLsp::new()),
    }
}
