//! Language Server Protocol client layer for an editor.
#![deny(missing_docs)]
//!
//! The crate connects an editor to one out-of-process language server per
//! language. It frames JSON-RPC messages over the servers' stdio, supervises
//! their processes through the `initialize` handshake and shutdown, selects
//! the adapter for the file being edited, forwards document synchronisation
//! notifications, and runs completion requests on a single worker that
//! correlates responses by id before filtering and ranking them.
//!
//! Server-specific details stay behind the [`LanguageAdapter`] trait so tests
//! and embedders can register lightweight adapters without spawning real
//! language servers. Every runtime failure is logged and reduced to a
//! negative result; the editor stays usable with no working server.

pub mod adapter;
pub mod completion;
mod config;
mod document;
mod errors;
mod language;
mod logging;
mod manager;
mod server;
mod sync;
pub mod telemetry;
mod uri;

pub use config::{ClientConfig, PollBudget, ServerOverride};
pub use document::{DocumentModel, DocumentSnapshot};
pub use errors::ManagerError;
pub use language::{Language, LanguageParseError};
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, LogFormatParseError, LogSettings};
pub use manager::{LspManager, PLAINTEXT_LANGUAGE_ID, SharedManager, lock_manager};
pub use server::LanguageAdapter;
pub use sync::DocumentSync;
pub use uri::{file_uri, path_to_file_uri, workspace_root_for};

#[cfg(test)]
mod tests;
