//! Languages served by out-of-process language servers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Languages the client can route to a language server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C and C++ via `clangd`.
    Cpp,
    /// Python via `pyright-langserver`.
    Python,
    /// TypeScript and JavaScript via `typescript-language-server`.
    TypeScript,
    /// Go via `gopls`.
    Go,
    /// Luau and Lua via `luau-lsp`.
    Luau,
}

impl Language {
    /// Every supported language, in registration order.
    pub const ALL: [Self; 5] = [
        Self::Cpp,
        Self::Python,
        Self::TypeScript,
        Self::Go,
        Self::Luau,
    ];

    /// Returns the lower-case identifier used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::Luau => "luau",
        }
    }

    /// Maps a file extension (without the dot) to a language.
    ///
    /// Matching is case-sensitive: `main.GO` is not recognised.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "c" | "cpp" | "cc" | "cxx" | "h" | "hpp" => Some(Self::Cpp),
            "py" => Some(Self::Python),
            "ts" | "tsx" | "js" | "jsx" => Some(Self::TypeScript),
            "go" => Some(Self::Go),
            "lua" | "luau" => Some(Self::Luau),
            _ => None,
        }
    }

    /// Maps a file path to a language using its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors raised when parsing language identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "cpp" | "c++" | "c" => Ok(Self::Cpp),
            "python" | "py" => Ok(Self::Python),
            "typescript" | "ts" | "javascript" | "js" => Ok(Self::TypeScript),
            "go" | "golang" => Ok(Self::Go),
            "luau" | "lua" => Ok(Self::Luau),
            other => Err(LanguageParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("main.go", Some(Language::Go))]
    #[case("script.luau", Some(Language::Luau))]
    #[case("init.lua", Some(Language::Luau))]
    #[case("src/lib.hpp", Some(Language::Cpp))]
    #[case("app.tsx", Some(Language::TypeScript))]
    #[case("tool.py", Some(Language::Python))]
    #[case("readme.md", None)]
    #[case("Makefile", None)]
    #[case("dir.v2/Makefile", None)]
    fn maps_paths_to_languages(#[case] path: &str, #[case] expected: Option<Language>) {
        assert_eq!(Language::from_path(Path::new(path)), expected);
    }

    #[rstest]
    fn parses_aliases() {
        assert_eq!("Golang".parse::<Language>(), Ok(Language::Go));
        assert_eq!(" lua ".parse::<Language>(), Ok(Language::Luau));

        let error = "cobol".parse::<Language>().expect_err("cobol is unsupported");
        assert_eq!(error.input(), "cobol");
    }

    #[rstest]
    fn display_matches_config_key() {
        for language in Language::ALL {
            assert_eq!(language.to_string(), language.as_str());
        }
    }
}
