//! Bounded frame queue filled by a dedicated reader thread per server.
//!
//! The reader thread blocks on the server's stdout and pushes every complete
//! frame into a [`FrameInbox`]. Consumers wait on the inbox with a timeout,
//! so no caller ever blocks on the pipe itself and a silent server costs a
//! bounded wait rather than a frozen thread.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::error::TransportError;
use super::transport::{TRANSPORT_TARGET, read_frame};
use crate::Language;

/// Outcome of a timed wait on an inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A frame body.
    Frame(Vec<u8>),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The reader has stopped and the queue is empty.
    Closed,
}

#[derive(Debug, Default)]
struct InboxState {
    frames: VecDeque<Vec<u8>>,
    closed: bool,
    dropped: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<InboxState>,
    ready: Condvar,
    capacity: usize,
}

/// Cloneable handle onto one server's queue of unread frames.
#[derive(Debug, Clone)]
pub struct FrameInbox {
    shared: Arc<Shared>,
}

impl FrameInbox {
    /// Creates an empty inbox holding at most `capacity` frames.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(InboxState::default()),
                ready: Condvar::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Appends a frame, discarding the oldest unread one when full.
    ///
    /// Returns `false` when a frame had to be discarded.
    pub fn push(&self, frame: Vec<u8>) -> bool {
        let mut state = self.lock();
        let mut kept_all = true;
        while state.frames.len() >= self.shared.capacity {
            state.frames.pop_front();
            state.dropped += 1;
            kept_all = false;
        }
        state.frames.push_back(frame);
        drop(state);
        self.shared.ready.notify_all();
        kept_all
    }

    /// Marks the inbox closed; queued frames remain readable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.shared.ready.notify_all();
    }

    /// Whether the reader has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of unread frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether there are no unread frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames discarded because the inbox was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    /// Removes and returns every unread frame.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.lock().frames.drain(..).collect()
    }

    /// Waits up to `timeout` for the next frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Received {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(frame) = state.frames.pop_front() {
                return Received::Frame(frame);
            }
            if state.closed {
                return Received::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return Received::Timeout;
            }
            state = self
                .shared
                .ready
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poison| poison.into_inner().0);
        }
    }
}

/// Starts the reader thread that moves frames from `stdout` into `inbox`.
///
/// The thread ends, closing the inbox, when the stream reaches EOF or fails;
/// a malformed header is logged and reading continues with the next frame.
///
/// # Errors
///
/// Returns the I/O error raised if the operating system refuses a new
/// thread.
pub fn spawn_reader<R>(
    mut stdout: R,
    inbox: FrameInbox,
    language: Language,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("lsp-reader-{language}"))
        .spawn(move || {
            loop {
                match read_frame(&mut stdout) {
                    Ok(frame) => {
                        trace!(
                            target: TRANSPORT_TARGET,
                            language = %language,
                            bytes = frame.len(),
                            "frame received"
                        );
                        if !inbox.push(frame) {
                            warn!(
                                target: TRANSPORT_TARGET,
                                language = %language,
                                "inbox full, oldest unread frame discarded"
                            );
                        }
                    }
                    Err(
                        error @ (TransportError::MissingContentLength
                        | TransportError::InvalidHeader),
                    ) => {
                        warn!(
                            target: TRANSPORT_TARGET,
                            language = %language,
                            error = %error,
                            "skipping malformed frame header"
                        );
                    }
                    Err(TransportError::Closed) => {
                        debug!(
                            target: TRANSPORT_TARGET,
                            language = %language,
                            "server output closed"
                        );
                        break;
                    }
                    Err(error) => {
                        warn!(
                            target: TRANSPORT_TARGET,
                            language = %language,
                            error = %error,
                            "stopping reader after transport failure"
                        );
                        break;
                    }
                }
            }
            inbox.close();
        })
}
