//! Failures of a supervised language server and of its stdio framing.

use std::io;

use thiserror::Error;

use super::jsonrpc::JsonRpcError;

/// Reasons an adapter could not start, talk to, or keep its server.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The executable does not exist on disk or on `PATH`.
    #[error("cannot find language server executable `{command}`")]
    BinaryNotFound {
        /// Executable as configured.
        command: String,
        /// Launch error reported by the OS.
        #[source]
        source: io::Error,
    },

    /// The process or one of its helper threads failed to start.
    #[error("could not launch language server ({context})")]
    SpawnFailed {
        /// Launch step that failed.
        context: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Writing a frame to the server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message body could not be encoded.
    #[error("cannot encode message body: {0}")]
    Codec(#[from] serde_json::Error),

    /// The server answered `initialize` with an error object.
    #[error("language server rejected the request with code {code}: {message}")]
    ServerError {
        /// JSON-RPC error code.
        code: i64,
        /// Server-supplied description.
        message: String,
    },

    /// No `initialize` result arrived within the handshake budget.
    #[error("no initialize result after {attempts} attempts")]
    HandshakeTimeout {
        /// Attempts spent waiting.
        attempts: u32,
    },

    /// The adapter has not completed its handshake.
    #[error("language server is not initialized")]
    NotReady,

    /// The server closed its output.
    #[error("language server output closed")]
    ProcessExited,
}

impl From<JsonRpcError> for AdapterError {
    fn from(error: JsonRpcError) -> Self {
        Self::ServerError {
            code: error.code,
            message: error.message,
        }
    }
}

/// Content-Length framing failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The pipe failed mid-read or mid-write.
    #[error("pipe error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended before a whole frame arrived.
    #[error("stream closed")]
    Closed,

    /// A header block carried no `Content-Length`.
    #[error("frame header lacks Content-Length")]
    MissingContentLength,

    /// A header line was not valid UTF-8 or its length did not parse.
    #[error("malformed frame header")]
    InvalidHeader,

    /// The declared body length exceeds the accepted maximum.
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Declared body length.
        length: usize,
        /// Accepted maximum.
        limit: usize,
    },
}
