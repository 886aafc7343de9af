//! In-memory document model used in tests.

use std::sync::Mutex;

use crate::document::{DocumentModel, DocumentSnapshot};

#[derive(Debug, Default)]
struct DocumentState {
    snapshot: DocumentSnapshot,
    changes: usize,
}

/// Buffer held in memory; edits update text, cursor, and line starts.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
}

impl MemoryDocument {
    /// Creates a document with the cursor at `cursor`.
    pub fn new(text: &str, cursor: usize) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                snapshot: DocumentSnapshot::from_text(text, cursor),
                changes: 0,
            }),
        }
    }

    /// Creates a document with the cursor at the end of the text.
    pub fn at_end(text: &str) -> Self {
        Self::new(text, text.len())
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.state.lock().expect("document lock").snapshot.text.clone()
    }

    /// Number of `mark_changed` calls.
    pub fn changes(&self) -> usize {
        self.state.lock().expect("document lock").changes
    }
}

impl DocumentModel for MemoryDocument {
    fn snapshot(&self) -> DocumentSnapshot {
        self.state.lock().expect("document lock").snapshot.clone()
    }

    fn replace_range(&self, start: usize, end: usize, text: &str) {
        let mut state = self.state.lock().expect("document lock");
        let mut buffer = state.snapshot.text.clone();
        assert!(buffer.get(start..end).is_some(), "invalid edit range {start}..{end}");
        buffer.replace_range(start..end, text);
        state.snapshot = DocumentSnapshot::from_text(buffer, start + text.len());
    }

    fn mark_changed(&self) {
        self.state.lock().expect("document lock").changes += 1;
    }
}
