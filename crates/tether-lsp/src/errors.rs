//! Error types surfaced by the adapter registry.

use thiserror::Error;

use crate::language::Language;

/// Errors returned by [`crate::LspManager`] registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// The language has already been registered.
    #[error("language '{language}' already has a registered adapter")]
    DuplicateLanguage {
        /// Language for which a duplicate adapter was registered.
        language: Language,
    },

    /// The requested language has not been registered.
    #[error("language '{language}' is not registered with the manager")]
    UnknownLanguage {
        /// Language requested by the caller.
        language: Language,
    },
}

impl ManagerError {
    /// Builds an `UnknownLanguage` error for the supplied language.
    pub(crate) fn unknown(language: Language) -> Self {
        Self::UnknownLanguage { language }
    }

    /// Builds a `DuplicateLanguage` error.
    pub(crate) fn duplicate(language: Language) -> Self {
        Self::DuplicateLanguage { language }
    }
}
