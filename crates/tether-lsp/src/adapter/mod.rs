//! Process-based language server adapters.
//!
//! This module spawns real language server processes (`clangd`,
//! `pyright-langserver`, `typescript-language-server`, `gopls`, `luau-lsp`)
//! and talks to them with JSON-RPC 2.0 over stdio. [`ProcessAdapter`]
//! implements [`LanguageAdapter`](crate::LanguageAdapter), so it can be
//! registered with [`LspManager`](crate::LspManager).
//!
//! # Architecture
//!
//! - [`transport`]: `Content-Length` framing over any byte stream
//! - [`FrameInbox`]: bounded queue filled by one reader thread per server
//! - [`ServerProcess`]: spawn, handshake, and shutdown of one subprocess
//! - [`ServerProfile`]: per-language executable, arguments, and language ids
//! - [`ProcessAdapter`]: composes a profile with a supervised process

mod config;
mod error;
mod inbox;
mod jsonrpc;
mod lifecycle;
mod process;
mod profile;
mod state;
mod supervisor;
mod trait_impl;
pub mod transport;

pub use config::ServerCommand;
pub use error::{AdapterError, TransportError};
pub use inbox::{FrameInbox, Received, spawn_reader};
pub use jsonrpc::{
    INITIALIZE_REQUEST_ID, JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ServerNotification, ServerRequest, next_request_id,
};
pub use process::{AdapterSettings, ProcessAdapter};
pub use profile::{Clangd, Gopls, LuauLsp, Pyright, ServerProfile, TypeScriptServer, default_profile};
pub use state::{AdapterState, AdapterStatus};
pub use supervisor::{ServerProcess, handshake, initialize_request};
