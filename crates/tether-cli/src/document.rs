//! Document model backed by a file read once at startup.

use std::sync::{Mutex, MutexGuard};

use tether_lsp::{DocumentModel, DocumentSnapshot};

/// Buffer loaded from disk; edits stay in memory.
#[derive(Debug)]
pub(crate) struct FileDocument {
    snapshot: Mutex<DocumentSnapshot>,
}

impl FileDocument {
    /// Wraps `text` with the cursor at `line`/`character`, or at the end of
    /// the text when that position does not exist.
    pub(crate) fn new(text: String, line: u32, character: u32) -> Self {
        let mut snapshot = DocumentSnapshot::from_text(text, 0);
        snapshot.cursor = snapshot
            .offset_of(line, character)
            .unwrap_or(snapshot.text.len());
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl DocumentModel for FileDocument {
    fn snapshot(&self) -> DocumentSnapshot {
        self.lock().clone()
    }

    fn replace_range(&self, start: usize, end: usize, text: &str) {
        let mut snapshot = self.lock();
        let mut buffer = std::mem::take(&mut snapshot.text);
        if buffer.get(start..end).is_some() {
            buffer.replace_range(start..end, text);
            *snapshot = DocumentSnapshot::from_text(buffer, start + text.len());
        } else {
            snapshot.text = buffer;
        }
    }

    fn mark_changed(&self) {}
}
