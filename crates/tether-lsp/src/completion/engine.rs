//! Single-worker completion queue.
//!
//! Requests are queued from the editor thread and handled one at a time by
//! a dedicated worker in enqueue order. The worker resolves the document's
//! language once, sends the request to that adapter, and waits on the
//! adapter's inbox for the response carrying the same id. Frames with other
//! ids belong to other traffic and are skipped.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::context::CursorContext;
use super::item::ReplacementRange;
use super::pending::PendingTable;
use super::ranking::{rank_items, result_entries};
use super::request::{CompletionRequest, completion_body};
use super::view::{CompletionView, RequestOutcome};
use crate::adapter::{FrameInbox, Received, next_request_id};
use crate::config::{ClientConfig, PollBudget};
use crate::document::{DocumentModel, DocumentSnapshot};
use crate::manager::{SharedManager, lock_manager};
use crate::uri::file_uri;

/// Log target for the completion pipeline.
pub(crate) const COMPLETION_TARGET: &str = "tether_lsp::completion";

struct Shared {
    manager: SharedManager,
    document: Arc<dyn DocumentModel>,
    pending: PendingTable,
    view: Mutex<CompletionView>,
    settled: Condvar,
    budget: PollBudget,
    max_items: usize,
}

impl Shared {
    fn view(&self) -> MutexGuard<'_, CompletionView> {
        self.view.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn settle(&self, request: &CompletionRequest, outcome: RequestOutcome) {
        let mut view = self.view();
        view.settle(request.id, outcome);
        drop(view);
        self.settled.notify_all();
        debug!(
            target: COMPLETION_TARGET,
            request_id = request.id,
            outcome = ?outcome,
            elapsed_ms = u64::try_from(request.enqueued_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "completion settled"
        );
    }
}

/// Queues completion requests and publishes ranked results.
pub struct CompletionEngine {
    shared: Arc<Shared>,
    sender: Option<Sender<CompletionRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl CompletionEngine {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised if the worker thread cannot be spawned.
    pub fn new(
        manager: SharedManager,
        document: Arc<dyn DocumentModel>,
        config: &ClientConfig,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            manager,
            document,
            pending: PendingTable::new(),
            view: Mutex::new(CompletionView::default()),
            settled: Condvar::new(),
            budget: config.completion,
            max_items: config.max_completions,
        });
        let (sender, receiver) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(String::from("lsp-completion"))
            .spawn(move || run_worker(&worker_shared, &receiver))?;
        Ok(Self {
            shared,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queues a completion at `line`/`character` in `path` and returns its id.
    ///
    /// Never blocks on the worker.
    pub fn request_completion(&self, path: &Path, line: u32, character: u32) -> i64 {
        let request = CompletionRequest::new(next_request_id(), path, line, character);
        let id = request.id;
        trace!(
            target: COMPLETION_TARGET,
            request_id = id,
            path = %path.display(),
            line,
            character,
            "completion queued"
        );
        let queued = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(request.clone()).is_ok());
        if !queued {
            warn!(target: COMPLETION_TARGET, request_id = id, "completion worker is gone");
            self.shared.settle(&request, RequestOutcome::Dropped);
        }
        id
    }

    /// Copy of the current completion state.
    #[must_use]
    pub fn view(&self) -> CompletionView {
        self.shared.view().clone()
    }

    /// Blocks until request `id` (or a later one) has settled.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_settled(&self, id: i64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut view = self.shared.view();
        while !view.has_settled(id) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            view = self
                .shared
                .settled
                .wait_timeout(view, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poison| poison.into_inner().0);
        }
        true
    }

    /// Applies the selected item to the document and hides the list.
    ///
    /// Returns `false` when the list is hidden or empty.
    pub fn accept_selected(&self) -> bool {
        let Some(item) = self.shared.view().selected().cloned() else {
            return false;
        };
        let document = &self.shared.document;
        let snapshot = document.snapshot();
        let (start, end) = replacement_span(&snapshot, item.range);
        document.replace_range(start, end, &item.insert_text);
        document.mark_changed();
        self.shared.view().visible = false;
        debug!(
            target: COMPLETION_TARGET,
            label = %item.label,
            start,
            end,
            "completion accepted"
        );
        true
    }

    /// Moves the highlight to `index`. Returns `false` if out of range.
    pub fn select(&self, index: usize) -> bool {
        let mut view = self.shared.view();
        if index >= view.items.len() {
            return false;
        }
        view.selected_index = index;
        true
    }

    /// Hides the list without applying anything.
    pub fn dismiss(&self) {
        self.shared.view().visible = false;
    }

    /// Number of requests sent and still awaiting a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }
}

impl Drop for CompletionEngine {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(target: COMPLETION_TARGET, "completion worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for CompletionEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CompletionEngine")
            .field("pending", &self.shared.pending.len())
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

/// Byte span for an item's range, or an insertion at the cursor when the
/// range does not fit the snapshot.
fn replacement_span(snapshot: &DocumentSnapshot, range: ReplacementRange) -> (usize, usize) {
    let start = snapshot.offset_of(range.start.line, range.start.character);
    let end = snapshot.offset_of(range.end.line, range.end.character);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => (start, end),
        _ => {
            let cursor = snapshot.cursor.min(snapshot.text.len());
            (cursor, cursor)
        }
    }
}

fn run_worker(shared: &Shared, receiver: &Receiver<CompletionRequest>) {
    for request in receiver {
        let outcome = process(shared, &request);
        shared.settle(&request, outcome);
    }
    debug!(target: COMPLETION_TARGET, "completion worker stopped");
}

enum Awaited {
    Response(Value),
    TimedOut,
    Closed,
}

fn process(shared: &Shared, request: &CompletionRequest) -> RequestOutcome {
    let snapshot = shared.document.snapshot();
    let cursor = CursorContext::resolve(&snapshot, request.line, request.character);
    let body = match completion_body(
        request.id,
        &file_uri(&request.path),
        cursor.position,
        cursor.trigger_byte(&snapshot),
    ) {
        Ok(body) => body,
        Err(error) => {
            warn!(target: COMPLETION_TARGET, request_id = request.id, error = %error, "failed to encode completion");
            return RequestOutcome::Failed;
        }
    };

    let Some(inbox) = send(shared, request, &body) else {
        return RequestOutcome::Dropped;
    };

    match await_response(&inbox, request.id, shared.budget) {
        Awaited::Response(response) => {
            shared.pending.take(request.id);
            apply_response(shared, request, &response)
        }
        Awaited::TimedOut => {
            shared.pending.take(request.id);
            info!(
                target: COMPLETION_TARGET,
                request_id = request.id,
                attempts = shared.budget.attempts,
                "completion timed out"
            );
            RequestOutcome::TimedOut
        }
        Awaited::Closed => {
            shared.pending.take(request.id);
            warn!(target: COMPLETION_TARGET, request_id = request.id, "server closed while awaiting completion");
            shared.view().clear();
            RequestOutcome::Failed
        }
    }
}

/// Sends the request to the adapter serving its path.
///
/// Returns the adapter's inbox, or `None` when no ready adapter serves the
/// file or the write failed.
fn send(shared: &Shared, request: &CompletionRequest, body: &[u8]) -> Option<FrameInbox> {
    let mut manager = lock_manager(&shared.manager);
    let Some(language) = manager.language_for(&request.path) else {
        debug!(target: COMPLETION_TARGET, request_id = request.id, path = %request.path.display(), "no adapter for completion");
        return None;
    };
    if !manager.is_ready(language) {
        debug!(target: COMPLETION_TARGET, request_id = request.id, language = %language, "adapter not ready, completion dropped");
        return None;
    }
    let inbox = manager.responses(language)?;

    let stale = inbox.drain().len();
    if stale > 0 {
        trace!(target: COMPLETION_TARGET, language = %language, stale, "discarded unread frames");
    }
    shared.pending.insert(request.clone());
    if !manager.send_to(language, body) {
        shared.pending.take(request.id);
        return None;
    }
    trace!(target: COMPLETION_TARGET, request_id = request.id, language = %language, "completion sent");
    Some(inbox)
}

fn await_response(inbox: &FrameInbox, id: i64, budget: PollBudget) -> Awaited {
    let deadline = Instant::now() + budget.total();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Awaited::TimedOut;
        }
        let frame = match inbox.recv_timeout(remaining.min(budget.interval())) {
            Received::Frame(frame) => frame,
            Received::Timeout => continue,
            Received::Closed => return Awaited::Closed,
        };
        match serde_json::from_slice::<Value>(&frame) {
            Ok(message) if is_response_to(&message, id) => return Awaited::Response(message),
            Ok(message) => trace!(
                target: COMPLETION_TARGET,
                request_id = id,
                other_id = ?message.get("id"),
                method = ?message.get("method").and_then(serde_json::Value::as_str),
                "skipping unrelated frame"
            ),
            Err(error) => debug!(
                target: COMPLETION_TARGET,
                request_id = id,
                error = %error,
                "skipping unparsable frame"
            ),
        }
    }
}

fn is_response_to(message: &Value, id: i64) -> bool {
    message.get("method").is_none() && message.get("id").and_then(Value::as_i64) == Some(id)
}

fn apply_response(shared: &Shared, request: &CompletionRequest, response: &Value) -> RequestOutcome {
    if let Some(error) = response.get("error") {
        warn!(
            target: COMPLETION_TARGET,
            request_id = request.id,
            code = ?error.get("code").and_then(serde_json::Value::as_i64),
            message = ?error.get("message").and_then(serde_json::Value::as_str),
            "server rejected completion"
        );
        shared.view().clear();
        return RequestOutcome::Failed;
    }
    let Some(entries) = response.get("result").and_then(result_entries) else {
        debug!(target: COMPLETION_TARGET, request_id = request.id, "completion response without usable result");
        shared.view().clear();
        return RequestOutcome::Failed;
    };

    let snapshot = shared.document.snapshot();
    let cursor = CursorContext::resolve(&snapshot, request.line, request.character);
    let ranked = rank_items(entries, &cursor, shared.max_items);
    let count = ranked.items.len();
    debug!(
        target: COMPLETION_TARGET,
        request_id = request.id,
        received = entries.len(),
        kept = count,
        context = %cursor.context,
        word = %cursor.word,
        "completion resolved"
    );
    shared.view().show(ranked.items, ranked.selected);
    RequestOutcome::Resolved { count }
}
