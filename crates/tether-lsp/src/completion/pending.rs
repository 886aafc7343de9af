//! Table of requests sent to a server and still awaiting a reply.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::request::CompletionRequest;

/// Outstanding requests keyed by id; at most one entry per id.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: Mutex<HashMap<i64, CompletionRequest>>,
}

impl PendingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, CompletionRequest>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Registers a request, replacing any entry with the same id.
    pub fn insert(&self, request: CompletionRequest) {
        self.lock().insert(request.id, request);
    }

    /// Removes and returns the entry for `id`.
    pub fn take(&self, id: i64) -> Option<CompletionRequest> {
        self.lock().remove(&id)
    }

    /// Whether `id` is still awaited.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
