//! Recording adapter used in tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Value, json};

use crate::adapter::{AdapterError, FrameInbox};
use crate::language::Language;
use crate::server::LanguageAdapter;

/// Scripted answer to one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A `result` carrying the request's id.
    Result(Value),
    /// A JSON-RPC `error` carrying the request's id.
    Error {
        /// Error code.
        code: i64,
        /// Error message.
        message: String,
    },
    /// A response for `stale_id` followed by the real result.
    AfterStale {
        /// Id of an earlier request.
        stale_id: i64,
        /// Result for the current request.
        result: Value,
    },
    /// A diagnostics notification followed by the real result.
    AfterDiagnostics(Value),
    /// No answer at all.
    Silence,
}

#[derive(Debug, Default)]
struct RecordingState {
    initialized: bool,
    fail_initialize: bool,
    initialize_calls: usize,
    shutdown_calls: usize,
    workspaces: Vec<PathBuf>,
    sent: Vec<Value>,
    replies: HashMap<String, VecDeque<Reply>>,
}

fn lock(shared: &Mutex<RecordingState>) -> MutexGuard<'_, RecordingState> {
    shared.lock().expect("recording state lock poisoned")
}

/// Test double that records every frame sent through it and answers
/// requests from a script.
#[derive(Debug)]
pub struct RecordingAdapter {
    language: Language,
    inbox: FrameInbox,
    shared: Arc<Mutex<RecordingState>>,
}

impl RecordingAdapter {
    /// Creates an adapter whose handshake succeeds.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            inbox: FrameInbox::new(64),
            shared: Arc::new(Mutex::new(RecordingState::default())),
        }
    }

    /// Creates an adapter whose handshake always fails.
    pub fn failing(language: Language) -> Self {
        let adapter = Self::new(language);
        lock(&adapter.shared).fail_initialize = true;
        adapter
    }

    /// Returns a handle for scripting replies and inspecting traffic.
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle {
            inbox: self.inbox.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl LanguageAdapter for RecordingAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn initialize(&mut self, workspace: &Path) -> Result<(), AdapterError> {
        let mut state = lock(&self.shared);
        state.initialize_calls += 1;
        state.workspaces.push(workspace.to_path_buf());
        if state.fail_initialize {
            return Err(AdapterError::HandshakeTimeout { attempts: 0 });
        }
        state.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        lock(&self.shared).initialized
    }

    fn send(&mut self, body: &[u8]) -> Result<(), AdapterError> {
        let mut state = lock(&self.shared);
        if !state.initialized {
            return Err(AdapterError::NotReady);
        }
        let message: Value = serde_json::from_slice(body)?;
        let request = message
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .zip(message.get("id").and_then(Value::as_i64));
        state.sent.push(message);

        let Some((method, id)) = request else {
            return Ok(());
        };
        let reply = state
            .replies
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Silence);
        for frame in reply_frames(id, reply) {
            self.inbox.push(frame.to_string().into_bytes());
        }
        Ok(())
    }

    fn responses(&self) -> Option<FrameInbox> {
        self.is_initialized().then(|| self.inbox.clone())
    }

    fn language_id(&self, _path: &Path) -> &'static str {
        self.language.as_str()
    }

    fn shutdown(&mut self) {
        let mut state = lock(&self.shared);
        state.shutdown_calls += 1;
        state.initialized = false;
    }
}

fn response(id: i64, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn reply_frames(id: i64, reply: Reply) -> Vec<Value> {
    match reply {
        Reply::Result(result) => vec![response(id, result)],
        Reply::Error { code, message } => vec![json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        })],
        Reply::AfterStale { stale_id, result } => vec![
            response(stale_id, json!([{ "label": "stale" }])),
            response(id, result),
        ],
        Reply::AfterDiagnostics(result) => vec![
            json!({
                "jsonrpc": "2.0",
                "method": "textDocument/publishDiagnostics",
                "params": { "uri": "file:///w/a.luau", "diagnostics": [] }
            }),
            response(id, result),
        ],
        Reply::Silence => Vec::new(),
    }
}

/// Shared view onto a [`RecordingAdapter`] after it moved into a manager.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    inbox: FrameInbox,
    shared: Arc<Mutex<RecordingState>>,
}

impl RecordingHandle {
    /// Queues a reply for the next request with `method`.
    pub fn script(&self, method: &str, reply: Reply) {
        lock(&self.shared)
            .replies
            .entry(method.to_owned())
            .or_default()
            .push_back(reply);
    }

    /// Every message sent, in order.
    pub fn sent(&self) -> Vec<Value> {
        lock(&self.shared).sent.clone()
    }

    /// Methods of every message sent, in order.
    pub fn sent_methods(&self) -> Vec<String> {
        lock(&self.shared)
            .sent
            .iter()
            .filter_map(|message| message.get("method").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    /// Messages sent with `method`.
    pub fn sent_with(&self, method: &str) -> Vec<Value> {
        lock(&self.shared)
            .sent
            .iter()
            .filter(|message| message.get("method").and_then(Value::as_str) == Some(method))
            .cloned()
            .collect()
    }

    /// Number of `initialize` calls.
    pub fn initialize_calls(&self) -> usize {
        lock(&self.shared).initialize_calls
    }

    /// Number of `shutdown` calls.
    pub fn shutdown_calls(&self) -> usize {
        lock(&self.shared).shutdown_calls
    }

    /// Workspaces passed to `initialize`.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        lock(&self.shared).workspaces.clone()
    }

    /// Whether the adapter is ready.
    pub fn is_initialized(&self) -> bool {
        lock(&self.shared).initialized
    }

    /// Pushes a raw frame as if the server had written it.
    pub fn push_frame(&self, frame: &Value) {
        self.inbox.push(frame.to_string().into_bytes());
    }
}
