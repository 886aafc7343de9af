//! Read/write seam onto the editor's document model.
//!
//! The completion pipeline reads buffer text, the cursor byte offset, and
//! per-line start offsets through [`DocumentModel::snapshot`], and applies an
//! accepted completion through [`DocumentModel::replace_range`]. Offsets are
//! byte offsets and columns are byte columns, matching the UTF-8 position
//! encoding negotiated during the handshake.

use lsp_types::Position;

/// Point-in-time copy of the buffer state the completion pipeline needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    /// Full buffer text.
    pub text: String,
    /// Cursor byte offset into `text`.
    pub cursor: usize,
    /// Byte offset at which each line starts; the first entry is `0`.
    pub line_starts: Vec<usize>,
}

impl DocumentSnapshot {
    /// Builds a snapshot, computing line starts from the text.
    #[must_use]
    pub fn from_text(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, byte)| *byte == b'\n')
                    .map(|(index, _)| index + 1),
            )
            .collect();
        Self {
            text,
            cursor,
            line_starts,
        }
    }

    /// Converts a line/column pair into a byte offset.
    ///
    /// Returns `None` when the line does not exist or the offset lies past
    /// the end of the text.
    #[must_use]
    pub fn offset_of(&self, line: u32, character: u32) -> Option<usize> {
        let start = *self.line_starts.get(usize::try_from(line).ok()?)?;
        let offset = start.checked_add(usize::try_from(character).ok()?)?;
        (offset <= self.text.len()).then_some(offset)
    }

    /// Converts a byte offset into the line/column pair containing it.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> Position {
        if self.line_starts.is_empty() {
            return Position::new(0, 0);
        }
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        Position::new(
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(offset.saturating_sub(start)).unwrap_or(u32::MAX),
        )
    }

    /// Byte immediately preceding `offset`, if any.
    #[must_use]
    pub fn byte_before(&self, offset: usize) -> Option<u8> {
        offset
            .checked_sub(1)
            .and_then(|index| self.text.as_bytes().get(index))
            .copied()
    }
}

/// Editor document model consumed by the completion pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentModel: Send + Sync {
    /// Returns the current buffer text, cursor and line starts.
    fn snapshot(&self) -> DocumentSnapshot;

    /// Deletes the byte range `[start, end)` and inserts `text` at `start`.
    fn replace_range(&self, start: usize, end: usize, text: &str);

    /// Flags the buffer as modified so the editor re-syncs and re-highlights.
    fn mark_changed(&self);
}
