//! Abstraction over per-language server bindings.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::Language;
use crate::adapter::{AdapterError, FrameInbox, Received};

/// Uniform capability set the manager drives for every language.
///
/// Implementations own one server session. Test doubles only need to supply
/// an inbox through [`LanguageAdapter::responses`]; reading is shared.
pub trait LanguageAdapter: Send {
    /// Language this adapter serves.
    fn language(&self) -> Language;

    /// Starts the server if needed and completes the handshake.
    ///
    /// Calling this on a ready adapter is a no-op. After a failure the
    /// adapter is not ready and the call may be retried.
    ///
    /// # Errors
    ///
    /// Returns the spawn, handshake, or transport failure.
    fn initialize(&mut self, workspace: &Path) -> Result<(), AdapterError>;

    /// Whether the handshake completed and the server is still running.
    fn is_initialized(&self) -> bool;

    /// Writes one framed message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotReady`] before a successful handshake and
    /// transport errors when the pipe is broken.
    fn send(&mut self, body: &[u8]) -> Result<(), AdapterError>;

    /// Handle onto frames read from the server, once it is running.
    fn responses(&self) -> Option<FrameInbox>;

    /// Waits up to `timeout` for the next frame from the server.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotReady`] when no server is running and
    /// [`AdapterError::ProcessExited`] once its output has closed.
    fn read_response(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, AdapterError> {
        let inbox = self.responses().ok_or(AdapterError::NotReady)?;
        match inbox.recv_timeout(timeout) {
            Received::Frame(frame) => Ok(Some(frame)),
            Received::Timeout => Ok(None),
            Received::Closed => Err(AdapterError::ProcessExited),
        }
    }

    /// LSP `languageId` reported for a document.
    fn language_id(&self, path: &Path) -> &'static str;

    /// Stops the server, if running. Never blocks indefinitely.
    fn shutdown(&mut self);
}

impl fmt::Debug for dyn LanguageAdapter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LanguageAdapter")
            .field("language", &self.language())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
